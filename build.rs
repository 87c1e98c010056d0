fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/kv/v1/kv.proto");

    let mut config = prost_build::Config::new();
    let protoc = protoc_bin_vendored::protoc_bin_path()
        .map_err(|e| format!("no bundled protoc for this platform: {:?}", e))?;
    config.protoc_executable(protoc);
    // Keys and values travel as `bytes::Bytes` end to end.
    config.bytes(["."]);

    tonic_build::configure().compile_protos_with_config(
        config,
        &["proto/kv/v1/kv.proto"],
        &["proto"],
    )?;
    Ok(())
}
