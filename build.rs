//! Generates the gRPC server and client stubs from `proto/file_service.proto`.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let proto_root = std::path::Path::new(manifest_dir).join("proto");
    let proto_file = proto_root.join("file_service.proto");

    println!("cargo:rerun-if-changed={}", proto_file.display());
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .bytes(["."])
        .compile_protos(std::slice::from_ref(&proto_file), &[proto_root])?;

    Ok(())
}
