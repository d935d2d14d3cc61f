fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the target build links against ESP-IDF; host tests skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
