use include_dir::{include_dir, Dir};

static SAMPLE_DIR: Dir = include_dir!("src/samples");

/// Names of the bundled practice texts, sorted for stable listings.
pub fn sample_names() -> Vec<String> {
    let mut names: Vec<String> = SAMPLE_DIR
        .files()
        .filter_map(|f| {
            f.path()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .collect();
    names.sort();
    names
}

/// Looks up a bundled practice text by name.
pub fn sample_text(name: &str) -> Option<&'static str> {
    SAMPLE_DIR
        .get_file(format!("{}.txt", name))
        .and_then(|f| f.contents_utf8())
}
