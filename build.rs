fn main() {
    // ESP-IDF toolchain wiring; host test builds skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
