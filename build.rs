use std::collections::HashSet;
use std::path::Path;

/// Top-level `ScanConfig` fields a preset may set
const CONFIG_FIELDS: &[&str] = &[
    "window_size",
    "score_cutoff",
    "merge_gap",
    "search_radius",
    "min_region_genes",
    "min_region_length",
    "min_score",
    "min_att_length",
    "max_att_mismatches",
    "search_inverted",
    "min_contig_length",
    "scoring",
    "normalization",
    "density",
];

fn main() {
    let presets_path = Path::new("presets/scan_presets.json");
    validate_presets_file(presets_path);
    set_build_dependencies();
}

fn validate_presets_file(presets_path: &Path) {
    // Ensure presets exist at build time
    assert!(
        presets_path.exists(),
        "\n\nPRESET BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the presets file before building.\n",
        presets_path.display()
    );

    let contents = std::fs::read_to_string(presets_path).unwrap_or_else(|e| {
        panic!(
            "\n\nPRESET BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            presets_path.display()
        );
    });

    let presets: serde_json::Value = serde_json::from_str(&contents).unwrap_or_else(|e| {
        panic!(
            "\n\nPRESET BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            presets_path.display()
        );
    });

    validate_presets_structure(&presets);
}

fn validate_presets_structure(root: &serde_json::Value) {
    assert!(
        root.is_object(),
        "\n\nPRESET BUILD ERROR: Root must be a JSON object\n\
         Got: {root}\n"
    );

    assert!(
        root.get("version").and_then(serde_json::Value::as_str).is_some(),
        "\n\nPRESET BUILD ERROR: Missing 'version' string\n"
    );

    let presets = root
        .get("presets")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!(
                "\n\nPRESET BUILD ERROR: Missing 'presets' array\n\
                 The file must have a top-level 'presets' array.\n"
            );
        });

    let mut seen = HashSet::new();
    for (i, preset) in presets.iter().enumerate() {
        let name = validate_preset(preset, i);
        assert!(
            seen.insert(name.to_lowercase()),
            "\n\nPRESET BUILD ERROR: Duplicate preset name '{name}'\n\
             Preset names are matched case-insensitively.\n"
        );
    }

    println!("cargo:warning=Validated {} scan presets", presets.len());
}

fn validate_preset(preset: &serde_json::Value, index: usize) -> &str {
    let name = preset
        .get("name")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_else(|| {
            panic!("\n\nPRESET BUILD ERROR: Preset at index {index} missing 'name' field\n");
        });

    assert!(
        preset.get("description").is_some(),
        "\n\nPRESET BUILD ERROR: Preset '{name}' (index {index}) missing 'description' field\n"
    );

    let config = preset
        .get("config")
        .and_then(serde_json::Value::as_object)
        .unwrap_or_else(|| {
            panic!(
                "\n\nPRESET BUILD ERROR: Preset '{name}' (index {index}) needs a 'config' object\n"
            );
        });

    for key in config.keys() {
        assert!(
            CONFIG_FIELDS.contains(&key.as_str()),
            "\n\nPRESET BUILD ERROR: Preset '{name}' sets unknown field '{key}'\n\
             Known fields: {}\n",
            CONFIG_FIELDS.join(", ")
        );
    }

    if let Some(window) = config.get("window_size").and_then(serde_json::Value::as_u64) {
        assert!(
            window > 0,
            "\n\nPRESET BUILD ERROR: Preset '{name}' has window_size 0\n"
        );
    }

    name
}

fn set_build_dependencies() {
    // Tell cargo to rerun if presets change
    println!("cargo:rerun-if-changed=presets/scan_presets.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
