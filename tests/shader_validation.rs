//! Validate the WGSL shader sources with naga, without touching a device.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use plexfield::shader;

fn validate(name: &str, source: &str) {
    let module = naga::front::wgsl::parse_str(source)
        .unwrap_or_else(|e| panic!("{name} failed to parse:\n{e}"));
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .unwrap_or_else(|e| panic!("{name} failed validation:\n{e:?}"));
}

#[test]
fn disc_shader_is_valid() {
    validate("disc", shader::DISC_SHADER);
}

#[test]
fn glow_shader_is_valid() {
    validate("glow", shader::GLOW_SHADER);
}

#[test]
fn line_shader_is_valid() {
    validate("line", shader::LINE_SHADER);
}

#[test]
fn fade_shader_is_valid() {
    validate("fade", shader::FADE_SHADER);
}

#[test]
fn blit_shader_is_valid() {
    validate("blit", shader::BLIT_SHADER);
}

#[test]
fn shaders_declare_expected_entry_points() {
    for (name, source) in [
        ("disc", shader::DISC_SHADER),
        ("glow", shader::GLOW_SHADER),
        ("line", shader::LINE_SHADER),
        ("fade", shader::FADE_SHADER),
        ("blit", shader::BLIT_SHADER),
    ] {
        let module = naga::front::wgsl::parse_str(source).expect(name);
        let entry_points: Vec<&str> =
            module.entry_points.iter().map(|ep| ep.name.as_str()).collect();
        assert!(entry_points.contains(&"vs_main"), "{name} missing vs_main");
        assert!(entry_points.contains(&"fs_main"), "{name} missing fs_main");
    }
}
