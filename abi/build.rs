use std::{env, fs, path::PathBuf};

use prost::Message;
use tonic_build::Builder;

fn main() {
    // protox compiles the proto in-process so the build doesn't need protoc
    let fds = protox::compile(["reservation.proto"], ["protos"]).unwrap();
    let fds_path = PathBuf::from(env::var("OUT_DIR").unwrap()).join("reservation_descriptor.bin");
    fs::write(&fds_path, fds.encode_to_vec()).unwrap();

    tonic_build::configure()
        .file_descriptor_set_path(&fds_path)
        .skip_protoc_run()
        .with_builder(&["reservation.ReservationQuery"])
        .with_builder_into(
            "reservation.ReservationQuery",
            &["room_type_id", "status", "page", "page_size", "desc"],
        )
        .with_builder_option("reservation.ReservationQuery", &["start", "end"])
        .compile_protos(&["protos/reservation.proto"], &["protos"])
        .unwrap();

    println!("cargo:rerun-if-changed=protos/reservation.proto");
}

trait BuilderExt {
    fn with_builder(self, paths: &[&str]) -> Self;
    fn with_builder_into(self, path: &str, fields: &[&str]) -> Self;
    fn with_builder_option(self, path: &str, fields: &[&str]) -> Self;
}

impl BuilderExt for Builder {
    fn with_builder(self, paths: &[&str]) -> Self {
        paths.iter().fold(self, |acc, path| {
            acc.type_attribute(path, "#[derive(derive_builder::Builder)]")
        })
    }

    fn with_builder_into(self, path: &str, fields: &[&str]) -> Self {
        fields.iter().fold(self, |acc, field| {
            acc.field_attribute(
                format!("{}.{}", path, field),
                "#[builder(setter(into), default)]",
            )
        })
    }

    fn with_builder_option(self, path: &str, fields: &[&str]) -> Self {
        fields.iter().fold(self, |acc, field| {
            acc.field_attribute(
                format!("{}.{}", path, field),
                "#[builder(setter(into, strip_option), default)]",
            )
        })
    }
}
