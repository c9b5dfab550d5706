//! File loading and sibling discovery.
//!
//! A model is a family of files sharing one base name; the last letter of
//! the extension selects the format (`.pim`, `.pit`, `.pic`, `.pip`, `.pis`).
//! Files are loaded one after another. A missing sibling is reported as
//! [`LoadStatus::FileNotFound`]; a malformed one fails only its own load.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::diagnostics::Diagnostics;
use crate::pit::{decode_pit, DecodeError, DecodeMode, LookRecord, MaterialSettings, PitGlobal, PitHeader, VariantRecord};
use crate::pix::{self, Container, ParseError, Section};
use crate::settings::ImportSettings;

/// Errors that can occur while loading a file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed container '{path}': {source}")]
    Malformed {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Members of the PIX format family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PixKind {
    /// Mesh
    Pim,
    /// Trait: looks and variants
    Pit,
    /// Collision
    Pic,
    /// Prefab
    Pip,
    /// Skeleton
    Pis,
    /// Animation
    Pia,
}

impl PixKind {
    const ALL: [PixKind; 6] = [
        PixKind::Pim,
        PixKind::Pit,
        PixKind::Pic,
        PixKind::Pip,
        PixKind::Pis,
        PixKind::Pia,
    ];

    /// Final letter of the extension.
    pub fn letter(self) -> char {
        match self {
            PixKind::Pim => 'm',
            PixKind::Pit => 't',
            PixKind::Pic => 'c',
            PixKind::Pip => 'p',
            PixKind::Pis => 's',
            PixKind::Pia => 'a',
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            PixKind::Pim => "pim",
            PixKind::Pit => "pit",
            PixKind::Pic => "pic",
            PixKind::Pip => "pip",
            PixKind::Pis => "pis",
            PixKind::Pia => "pia",
        }
    }

    /// Kind of a file, judged by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.iter().copied().find(|k| k.extension() == ext)
    }
}

/// Path of a sibling file: the model path with its last character replaced
/// by the kind's extension letter.
pub fn sibling_path(model: &Path, kind: PixKind) -> PathBuf {
    match model.as_os_str().to_os_string().into_string() {
        Ok(mut text) => {
            text.pop();
            text.push(kind.letter());
            PathBuf::from(text)
        }
        Err(_) => model.with_extension(kind.extension()),
    }
}

/// Whether a file was there to load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    #[default]
    Ok,
    FileNotFound,
}

/// Result of loading one PIT file.
#[derive(Clone, Debug, Default)]
pub struct PitLoad {
    pub status: LoadStatus,
    pub header: Option<PitHeader>,
    pub global: Option<PitGlobal>,
    pub looks: Vec<LookRecord>,
    pub variants: Vec<VariantRecord>,
    pub diagnostics: Diagnostics,

    /// The decoded tree, kept so material sections can be resolved
    pub container: Option<Container>,
}

impl PitLoad {
    fn not_found() -> Self {
        Self {
            status: LoadStatus::FileNotFound,
            ..Default::default()
        }
    }

    /// The `Material` section a material record was decoded from.
    pub fn material_section(&self, material: &MaterialSettings) -> Option<&Section> {
        self.container.as_ref()?.resolve(&material.section)
    }
}

/// Read a whole file, mapping "not found" to `None`.
fn read_file(path: &Path) -> LoadResult<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load any PIX file as a bare container. `None` if the file does not exist.
pub fn load_container<P: AsRef<Path>>(path: P) -> LoadResult<Option<Container>> {
    let path = path.as_ref();
    let Some(bytes) = read_file(path)? else {
        return Ok(None);
    };

    pix::decode(&bytes)
        .map(Some)
        .map_err(|source| LoadError::Malformed {
            path: path.display().to_string(),
            source,
        })
}

/// Load a PIT file and decode its looks and variants.
///
/// # Example
///
/// ```ignore
/// use scs_core::loader::load_pit;
/// use scs_core::pit::DecodeMode;
///
/// let pit = load_pit("vehicle/truck/truck.pit", DecodeMode::Lenient)?;
/// for look in &pit.looks {
///     println!("{:?}: {} materials", look.name, look.materials.len());
/// }
/// ```
pub fn load_pit<P: AsRef<Path>>(path: P, mode: DecodeMode) -> LoadResult<PitLoad> {
    let path = path.as_ref();
    match load_container(path)? {
        Some(container) => {
            log::info!("Loading PIT file {}", path.display());
            load_pit_container(container, mode)
        }
        None => {
            log::info!("No PIT file at {}", path.display());
            Ok(PitLoad::not_found())
        }
    }
}

/// Load PIT data from a string (useful for testing).
pub fn load_pit_from_string(content: &str, name: &str, mode: DecodeMode) -> LoadResult<PitLoad> {
    let container = pix::parse_pix(content).map_err(|source| LoadError::Malformed {
        path: name.to_string(),
        source,
    })?;
    load_pit_container(container, mode)
}

fn load_pit_container(container: Container, mode: DecodeMode) -> LoadResult<PitLoad> {
    let mut diagnostics = Diagnostics::new();
    let pit = decode_pit(&container, mode, &mut diagnostics)?;

    log::info!(
        "Loaded {} looks, {} variants ({} warnings)",
        pit.looks.len(),
        pit.variants.len(),
        diagnostics.len()
    );

    Ok(PitLoad {
        status: LoadStatus::Ok,
        header: pit.header,
        global: pit.global,
        looks: pit.looks,
        variants: pit.variants,
        diagnostics,
        container: Some(container),
    })
}

/// What happened to one file of a model import.
#[derive(Debug)]
pub enum FileOutcome {
    Loaded,
    NotFound,
    Failed(LoadError),
}

/// One file of a model import.
#[derive(Debug)]
pub struct FileImport {
    pub kind: PixKind,
    pub path: PathBuf,
    pub outcome: FileOutcome,

    /// Decoded container. PIT containers live in [`ModelImport::pit`] instead.
    pub container: Option<Container>,
}

impl FileImport {
    fn load(kind: PixKind, path: PathBuf) -> Self {
        let (outcome, container) = match load_container(&path) {
            Ok(Some(container)) => {
                log::info!("Loaded {} sections from {}", container.len(), path.display());
                (FileOutcome::Loaded, Some(container))
            }
            Ok(None) => {
                log::info!("No {} file at {}", kind.extension().to_uppercase(), path.display());
                (FileOutcome::NotFound, None)
            }
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
                (FileOutcome::Failed(e), None)
            }
        };

        Self {
            kind,
            path,
            outcome,
            container,
        }
    }
}

/// Everything loaded for one model.
#[derive(Debug, Default)]
pub struct ModelImport {
    /// Model name: the file stem of the model path
    pub name: String,

    /// Files in load order
    pub files: Vec<FileImport>,

    /// Decoded trait data, if the PIT file was requested and loaded
    pub pit: Option<PitLoad>,
}

impl ModelImport {
    /// First file of the given kind.
    pub fn file(&self, kind: PixKind) -> Option<&FileImport> {
        self.files.iter().find(|f| f.kind == kind)
    }

    pub fn looks(&self) -> &[LookRecord] {
        self.pit.as_ref().map_or(&[], |p| p.looks.as_slice())
    }

    pub fn variants(&self) -> &[VariantRecord] {
        self.pit.as_ref().map_or(&[], |p| p.variants.as_slice())
    }

    /// Files whose load failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileImport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed(_)))
    }
}

/// Import a model and its sibling files according to `settings`.
///
/// Files are loaded in a fixed order (mesh, trait, collision, prefab,
/// skeleton, animations). Earlier results are kept when a later file fails.
pub fn import_model<P: AsRef<Path>>(model_path: P, settings: &ImportSettings) -> ModelImport {
    let model_path = model_path.as_ref();
    let name = model_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string();

    let mut import = ModelImport {
        name,
        ..Default::default()
    };

    if settings.wants_pim() {
        import
            .files
            .push(FileImport::load(PixKind::Pim, model_path.to_path_buf()));
    }

    if settings.import_pit {
        let path = sibling_path(model_path, PixKind::Pit);
        let outcome = match load_pit(&path, settings.decode_mode()) {
            Ok(load) => {
                let outcome = match load.status {
                    LoadStatus::Ok => FileOutcome::Loaded,
                    LoadStatus::FileNotFound => FileOutcome::NotFound,
                };
                import.pit = Some(load);
                outcome
            }
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
                FileOutcome::Failed(e)
            }
        };
        import.files.push(FileImport {
            kind: PixKind::Pit,
            path,
            outcome,
            container: None,
        });
    }

    let siblings = [
        (settings.import_pic, PixKind::Pic),
        (settings.import_pip, PixKind::Pip),
        (settings.import_pis, PixKind::Pis),
    ];
    for (enabled, kind) in siblings {
        if enabled {
            import
                .files
                .push(FileImport::load(kind, sibling_path(model_path, kind)));
        }
    }

    if settings.wants_pia() {
        let dir = model_path.parent().unwrap_or_else(|| Path::new("."));
        let animations = find_animation_files(dir, settings.include_subdirs_for_pia);
        if animations.is_empty() {
            log::info!("No PIA files in {}", dir.display());
        }
        for path in animations {
            import.files.push(FileImport::load(PixKind::Pia, path));
        }
    }

    import
}

/// Collect `.pia` files in `dir` (and its subdirectories if `recursive`),
/// in walk order with entries sorted by file name. Symlinks are not followed.
pub fn find_animation_files(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).max_depth(max_depth).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Cannot read {}: {}", dir.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file() && PixKind::from_path(entry.path()) == Some(PixKind::Pia) {
            found.push(entry.into_path());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Helper to get test asset path (works from any working directory)
    fn test_asset_path(relative: &str) -> PathBuf {
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        let crate_root = Path::new(&manifest_dir);
        // Go up to workspace root
        let workspace_root = crate_root.parent().unwrap().parent().unwrap();
        workspace_root.join("assets").join(relative)
    }

    #[test]
    fn test_sibling_path_swaps_last_letter() {
        let model = Path::new("vehicle/truck/truck.pim");
        assert_eq!(sibling_path(model, PixKind::Pit), PathBuf::from("vehicle/truck/truck.pit"));
        assert_eq!(sibling_path(model, PixKind::Pic), PathBuf::from("vehicle/truck/truck.pic"));
        assert_eq!(sibling_path(model, PixKind::Pis), PathBuf::from("vehicle/truck/truck.pis"));
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(PixKind::from_path(Path::new("a/b.PIT")), Some(PixKind::Pit));
        assert_eq!(PixKind::from_path(Path::new("a/b.pia")), Some(PixKind::Pia));
        assert_eq!(PixKind::from_path(Path::new("a/b.txt")), None);
        assert_eq!(PixKind::from_path(Path::new("a/b")), None);
    }

    #[test]
    fn test_load_pit_from_string() {
        let pit = load_pit_from_string(
            r#"Look { Name: "default" Material { Alias: "m1" Effect: "eut2.dif" AttributeCount: 0 TextureCount: 0 } }"#,
            "inline",
            DecodeMode::Lenient,
        )
        .unwrap();

        assert_eq!(pit.status, LoadStatus::Ok);
        assert_eq!(pit.looks.len(), 1);
        assert!(pit.variants.is_empty());

        let material = &pit.looks[0].materials["m1"];
        let section = pit.material_section(material).unwrap();
        assert_eq!(section.kind, "Material");
        assert_eq!(
            section.get_prop_value("Effect").and_then(|v| v.as_str()),
            Some("eut2.dif")
        );
    }

    #[test]
    fn test_malformed_string_is_an_error() {
        let err = load_pit_from_string("Look {", "broken", DecodeMode::Lenient).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_strict_missing_header_is_fatal() {
        let err = load_pit_from_string(r#"Look { Name: "x" }"#, "strict", DecodeMode::Strict).unwrap_err();
        assert!(matches!(err, LoadError::Decode(DecodeError::MissingSection("Header"))));
    }

    #[test]
    fn test_load_pit_fixture() {
        init_logging();
        let pit = load_pit(test_asset_path("truck/truck.pit"), DecodeMode::Strict).unwrap();

        assert_eq!(pit.status, LoadStatus::Ok);
        assert!(pit.diagnostics.is_empty(), "{:?}", pit.diagnostics);
        assert_eq!(pit.header.as_ref().and_then(|h| h.name.as_deref()), Some("truck"));
        assert_eq!(pit.looks.len(), 2);
        assert_eq!(pit.variants.len(), 2);

        for look in &pit.looks {
            for material in look.materials.values() {
                assert_eq!(material.attribute_count, Some(material.attributes.len() as i64));
                assert_eq!(material.texture_count, Some(material.textures.len() as i64));
            }
        }

        let variant = pit.variants.iter().find(|v| v.name.as_deref() == Some("no_spoiler")).unwrap();
        assert_eq!(variant.parts, vec!["body", "wheels"]);
    }

    #[test]
    fn test_missing_pit_is_not_an_error() {
        let pit = load_pit(test_asset_path("lonely/lonely.pit"), DecodeMode::Lenient).unwrap();

        assert_eq!(pit.status, LoadStatus::FileNotFound);
        assert!(pit.looks.is_empty());
        assert!(pit.variants.is_empty());
        assert!(pit.container.is_none());
    }

    #[test]
    fn test_import_model_keeps_results_around_failures() {
        init_logging();
        let settings = ImportSettings::default();
        let import = import_model(test_asset_path("truck/truck.pim"), &settings);

        assert_eq!(import.name, "truck");
        assert!(matches!(import.file(PixKind::Pim).unwrap().outcome, FileOutcome::Loaded));
        assert!(matches!(import.file(PixKind::Pit).unwrap().outcome, FileOutcome::Loaded));
        assert!(matches!(
            import.file(PixKind::Pic).unwrap().outcome,
            FileOutcome::Failed(LoadError::Malformed { .. })
        ));
        assert!(matches!(import.file(PixKind::Pip).unwrap().outcome, FileOutcome::NotFound));
        assert!(matches!(import.file(PixKind::Pis).unwrap().outcome, FileOutcome::Loaded));

        assert_eq!(import.looks().len(), 2);
        assert_eq!(import.variants().len(), 2);
        assert_eq!(import.failures().count(), 1);

        let mesh = import.file(PixKind::Pim).unwrap().container.as_ref().unwrap();
        assert!(mesh.get_section("Header").is_some());
    }

    #[test]
    fn test_import_model_without_pit() {
        let import = import_model(test_asset_path("lonely/lonely.pim"), &ImportSettings::default());

        assert!(matches!(import.file(PixKind::Pim).unwrap().outcome, FileOutcome::Loaded));
        assert!(matches!(import.file(PixKind::Pit).unwrap().outcome, FileOutcome::NotFound));
        assert_eq!(import.pit.as_ref().map(|p| p.status), Some(LoadStatus::FileNotFound));
        assert!(import.looks().is_empty());
        assert!(import.variants().is_empty());
    }

    #[test]
    fn test_import_respects_settings() {
        let settings = ImportSettings {
            import_pic: false,
            import_pip: false,
            import_pis: false,
            ..Default::default()
        };
        let import = import_model(test_asset_path("truck/truck.pim"), &settings);

        assert!(import.file(PixKind::Pic).is_none());
        assert!(import.file(PixKind::Pia).is_none());
        assert_eq!(import.failures().count(), 0);
    }

    #[test]
    fn test_find_animation_files() {
        let dir = test_asset_path("truck");

        let shallow = find_animation_files(&dir, false);
        assert_eq!(shallow.len(), 1);
        assert!(shallow[0].ends_with("open_door.pia"));

        let deep = find_animation_files(&dir, true);
        assert_eq!(deep.len(), 2);
        assert!(deep.iter().any(|p| p.ends_with("anim/wave.pia")));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_animation_files_ignores_symlink_cycles() {
        let dir = std::env::temp_dir().join(format!("scs_core_pia_cycle_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("a.pia"), "Header { FormatVersion: 3 }\n").unwrap();
        std::os::unix::fs::symlink("..", dir.join("sub").join("back")).unwrap();

        let found = find_animation_files(&dir, true);
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(found, vec![dir.join("a.pia")]);
    }
}
