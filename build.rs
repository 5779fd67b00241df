#![forbid(unsafe_code)]

// Capture build information that hero_server logs at startup.
fn main() {
    build_data::set_RUSTC_VERSION();

    // Git details exist only when building from a checkout.
    if std::path::Path::new(".git").exists() {
        build_data::set_GIT_BRANCH();
        build_data::set_GIT_COMMIT_SHORT();
        build_data::set_GIT_DIRTY();
        build_data::set_SOURCE_TIMESTAMP();  // BUILD_TIMESTAMP would make builds unreproducible.
    }
}
