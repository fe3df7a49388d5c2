fn main() {
    println!("cargo:rerun-if-env-changed=BOOT_LOG_LEVEL");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=linker.ld");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=mips-nintendo64-none.json");

    if std::env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("mips") {
        let script = format!("{}/{}", env!("CARGO_MANIFEST_DIR"), "linker.ld");
        println!("cargo:rustc-link-arg-bins=-T{}", script);
    }
}
