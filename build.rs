fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only firmware builds need the ESP-IDF environment forwarded to rustc.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
