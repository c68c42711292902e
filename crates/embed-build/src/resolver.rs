//! Library directory discovery and object/source path mapping
//!
//! Every compilation unit has exactly one object file. Project sources in
//! `src/` map to `build/`, sources of library `<lib>` map to `build/<lib>/`.
//! The mapping runs in both directions so the `.o` pattern rule can find the
//! source for any object it is asked to produce.

use crate::config::{BuildConfig, CORE_LIBRARY};
use crate::error::{BuildError, BuildResult, DirKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source extensions, in lookup priority order
pub const SOURCE_EXTENSIONS: [&str; 3] = ["c", "cpp", "S"];

/// Extension assumed when no candidate source exists
const FALLBACK_EXTENSION: &str = "cpp";

/// Which tree an object file belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespace {
    /// The project's own `src/` tree
    Project,
    /// One of the configured libraries
    Library(String),
}

/// Resolves library directories and maps objects to sources
#[derive(Debug, Clone)]
pub struct PathResolver {
    build_dir: PathBuf,
    src_dir: PathBuf,
    libraries_dir: PathBuf,
    toolchain_root: PathBuf,
    libraries: Vec<String>,
}

impl PathResolver {
    /// Create a resolver over the paths of a build configuration
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            build_dir: config.build_dir.clone(),
            src_dir: config.src_dir.clone(),
            libraries_dir: config.libraries_dir.clone(),
            toolchain_root: config.toolchain_root.clone(),
            libraries: config.libraries.clone(),
        }
    }

    /// Configured library names
    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    /// Candidate source directories for a library, in probe order
    pub fn source_dir_candidates(&self, library: &str) -> Vec<PathBuf> {
        if library == CORE_LIBRARY {
            return vec![self.avr_root().join("cores").join(CORE_LIBRARY)];
        }
        vec![
            self.libraries_dir.join(library),
            self.toolchain_root
                .join("libraries")
                .join(library)
                .join("src/avr"),
            self.avr_root().join("libraries").join(library),
        ]
    }

    /// Candidate include directories for a library, in probe order
    pub fn include_dir_candidates(&self, library: &str) -> Vec<PathBuf> {
        if library == CORE_LIBRARY {
            return self.source_dir_candidates(library);
        }
        vec![
            self.libraries_dir.join(library),
            self.toolchain_root.join("libraries").join(library).join("src"),
            self.avr_root().join("libraries").join(library),
        ]
    }

    /// First existing source directory of a library
    pub fn library_source_dir(&self, library: &str) -> BuildResult<PathBuf> {
        probe(library, DirKind::Source, self.source_dir_candidates(library))
    }

    /// First existing include directory of a library
    pub fn library_include_dir(&self, library: &str) -> BuildResult<PathBuf> {
        probe(library, DirKind::Include, self.include_dir_candidates(library))
    }

    /// Object files of one library
    pub fn library_objects(&self, library: &str) -> BuildResult<Vec<PathBuf>> {
        let src_dir = self.library_source_dir(library)?;
        let obj_dir = self.build_dir.join(library);
        objects_for(&list_sources(&src_dir)?, &src_dir, &obj_dir)
    }

    /// Object files of every configured library, in library order
    pub fn all_library_objects(&self) -> BuildResult<Vec<PathBuf>> {
        let mut objects = Vec::new();
        for library in &self.libraries {
            objects.extend(self.library_objects(library)?);
        }
        Ok(objects)
    }

    /// Compilation units directly inside the project source directory
    pub fn project_sources(&self) -> BuildResult<Vec<PathBuf>> {
        if !self.src_dir.is_dir() {
            return Ok(Vec::new());
        }
        list_sources(&self.src_dir)
    }

    /// Object files of the project itself
    pub fn project_objects(&self) -> BuildResult<Vec<PathBuf>> {
        objects_for(&self.project_sources()?, &self.src_dir, &self.build_dir)
    }

    /// Which object namespace contains `object`
    ///
    /// Library namespaces take precedence over the project namespace.
    pub fn namespace_of(&self, object: &Path) -> Namespace {
        self.libraries
            .iter()
            .find(|lib| object.starts_with(self.build_dir.join(lib.as_str())))
            .map(|lib| Namespace::Library(lib.clone()))
            .unwrap_or(Namespace::Project)
    }

    /// Object file a source compiles to, if the source lies in a known tree
    pub fn object_for_source(&self, source: &Path) -> Option<PathBuf> {
        for library in &self.libraries {
            if let Ok(src_dir) = self.library_source_dir(library) {
                if source.starts_with(&src_dir) {
                    return mirror(source, &src_dir, &self.build_dir.join(library));
                }
            }
        }
        mirror(source, &self.src_dir, &self.build_dir)
    }

    /// Source file an object compiles from
    ///
    /// Tries `.c`, `.cpp` and `.S` in the object's namespace and returns the
    /// first that exists. When none does, the `.cpp` candidate is returned so
    /// the caller can report it as missing.
    pub fn source_for_object(&self, object: &Path) -> PathBuf {
        let (obj_root, src_root) = match self.namespace_of(object) {
            Namespace::Library(library) => {
                let src_root = self.library_source_dir(&library).unwrap_or_else(|_| {
                    self.source_dir_candidates(&library)
                        .swap_remove(0)
                });
                (self.build_dir.join(&library), src_root)
            }
            Namespace::Project => (self.build_dir.clone(), self.src_dir.clone()),
        };

        let stem = match object.strip_prefix(&obj_root) {
            Ok(relative) => src_root.join(relative),
            Err(_) => object.to_path_buf(),
        };

        SOURCE_EXTENSIONS
            .iter()
            .map(|ext| stem.with_extension(ext))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| stem.with_extension(FALLBACK_EXTENSION))
    }

    fn avr_root(&self) -> PathBuf {
        self.toolchain_root.join("hardware/arduino/avr")
    }
}

/// Whether a path names a C, C++ or assembly compilation unit
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Swap the `from` prefix for `to` and the extension for `.o`
fn mirror(source: &Path, from: &Path, to: &Path) -> Option<PathBuf> {
    let relative = source.strip_prefix(from).ok()?;
    Some(to.join(relative).with_extension("o"))
}

/// Objects for a sorted source list; two sources sharing a stem is an error
fn objects_for(sources: &[PathBuf], from: &Path, to: &Path) -> BuildResult<Vec<PathBuf>> {
    let mut owners: HashMap<PathBuf, &PathBuf> = HashMap::new();
    let mut objects = Vec::with_capacity(sources.len());
    for source in sources {
        let Some(object) = mirror(source, from, to) else {
            continue;
        };
        if let Some(first) = owners.insert(object.clone(), source) {
            return Err(BuildError::DuplicateObject {
                object,
                first: first.clone(),
                second: source.clone(),
            });
        }
        objects.push(object);
    }
    Ok(objects)
}

fn probe(library: &str, kind: DirKind, candidates: Vec<PathBuf>) -> BuildResult<PathBuf> {
    match candidates.iter().find(|dir| dir.is_dir()) {
        Some(dir) => {
            log::debug!("library '{}' {} dir: {}", library, kind, dir.display());
            Ok(dir.clone())
        }
        None => Err(BuildError::resolution(library, kind, &candidates)),
    }
}

fn list_sources(dir: &Path) -> BuildResult<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            BuildError::io(path, e.into())
        })?;
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn setup(libraries: &[&str]) -> (TempDir, PathResolver) {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig::builder()
            .project_root(dir.path())
            .toolchain_root(dir.path().join("arduino"))
            .libraries(libraries.iter().copied())
            .build();
        let resolver = PathResolver::new(&config);
        (dir, resolver)
    }

    #[test]
    fn test_core_library_uses_fixed_path() {
        let (dir, resolver) = setup(&["arduino"]);
        let core = dir.path().join("arduino/hardware/arduino/avr/cores/arduino");
        assert_eq!(resolver.source_dir_candidates("arduino"), vec![core.clone()]);

        assert!(resolver.library_source_dir("arduino").is_err());
        fs::create_dir_all(&core).unwrap();
        assert_eq!(resolver.library_source_dir("arduino").unwrap(), core);
    }

    #[test]
    fn test_project_local_library_wins() {
        let (dir, resolver) = setup(&["Wire"]);
        let local = dir.path().join("libraries/Wire");
        let bundled = dir.path().join("arduino/hardware/arduino/avr/libraries/Wire");
        fs::create_dir_all(&local).unwrap();
        fs::create_dir_all(&bundled).unwrap();

        assert_eq!(resolver.library_source_dir("Wire").unwrap(), local);
        assert_eq!(resolver.library_include_dir("Wire").unwrap(), local);
    }

    #[test]
    fn test_versioned_library_layout() {
        let (dir, resolver) = setup(&["Servo"]);
        let src = dir.path().join("arduino/libraries/Servo/src/avr");
        fs::create_dir_all(&src).unwrap();

        assert_eq!(resolver.library_source_dir("Servo").unwrap(), src);
        assert_eq!(
            resolver.library_include_dir("Servo").unwrap(),
            dir.path().join("arduino/libraries/Servo/src")
        );
    }

    #[test]
    fn test_missing_library_reports_candidates() {
        let (_dir, resolver) = setup(&["Nope"]);
        match resolver.library_source_dir("Nope") {
            Err(BuildError::ResolutionFailure { library, kind, tried }) => {
                assert_eq!(library, "Nope");
                assert_eq!(kind, DirKind::Source);
                assert!(tried.contains("libraries/Nope"));
            }
            other => panic!("Expected ResolutionFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_library_objects_mirror_sources() {
        let (dir, resolver) = setup(&["arduino"]);
        let core = dir.path().join("arduino/hardware/arduino/avr/cores/arduino");
        touch(&core.join("wiring.c"));
        touch(&core.join("HardwareSerial.cpp"));
        touch(&core.join("wiring_pulse.S"));
        touch(&core.join("Arduino.h"));

        let objects = resolver.library_objects("arduino").unwrap();
        let build = dir.path().join("build/arduino");
        assert_eq!(
            objects,
            vec![
                build.join("HardwareSerial.o"),
                build.join("wiring.o"),
                build.join("wiring_pulse.o"),
            ]
        );
    }

    #[test]
    fn test_source_for_library_object_tries_extensions() {
        let (dir, resolver) = setup(&["arduino"]);
        let core = dir.path().join("arduino/hardware/arduino/avr/cores/arduino");
        touch(&core.join("wiring_pulse.S"));

        let object = dir.path().join("build/arduino/wiring_pulse.o");
        assert_eq!(resolver.source_for_object(&object), core.join("wiring_pulse.S"));
    }

    #[test]
    fn test_source_for_project_object() {
        let (dir, resolver) = setup(&["arduino"]);
        touch(&dir.path().join("src/main.cpp"));
        touch(&dir.path().join("src/util.c"));

        assert_eq!(
            resolver.source_for_object(&dir.path().join("build/main.o")),
            dir.path().join("src/main.cpp")
        );
        assert_eq!(
            resolver.source_for_object(&dir.path().join("build/util.o")),
            dir.path().join("src/util.c")
        );
    }

    #[test]
    fn test_source_for_object_falls_back_to_cpp() {
        let (dir, resolver) = setup(&["arduino"]);
        assert_eq!(
            resolver.source_for_object(&dir.path().join("build/ghost.o")),
            dir.path().join("src/ghost.cpp")
        );
    }

    #[test]
    fn test_c_wins_over_cpp_with_same_stem() {
        let (dir, resolver) = setup(&[]);
        touch(&dir.path().join("src/dup.c"));
        touch(&dir.path().join("src/dup.cpp"));
        assert_eq!(
            resolver.source_for_object(&dir.path().join("build/dup.o")),
            dir.path().join("src/dup.c")
        );
    }

    #[test]
    fn test_shared_stem_is_rejected() {
        let (dir, resolver) = setup(&["arduino"]);
        let core = dir.path().join("arduino/hardware/arduino/avr/cores/arduino");
        touch(&core.join("wiring.c"));
        touch(&core.join("wiring.S"));

        match resolver.library_objects("arduino") {
            Err(BuildError::DuplicateObject {
                object,
                first,
                second,
            }) => {
                assert_eq!(object, dir.path().join("build/arduino/wiring.o"));
                assert_eq!(first, core.join("wiring.S"));
                assert_eq!(second, core.join("wiring.c"));
            }
            other => panic!("Expected DuplicateObject, got {:?}", other),
        }
    }

    #[test]
    fn test_namespace_of() {
        let (dir, resolver) = setup(&["arduino", "Wire"]);
        let build = dir.path().join("build");
        assert_eq!(resolver.namespace_of(&build.join("main.o")), Namespace::Project);
        assert_eq!(
            resolver.namespace_of(&build.join("Wire/Wire.o")),
            Namespace::Library("Wire".to_string())
        );
        // Prefix match is per path component
        assert_eq!(resolver.namespace_of(&build.join("Wired.o")), Namespace::Project);
    }

    #[test]
    fn test_project_sources_without_src_dir() {
        let (_dir, resolver) = setup(&[]);
        assert!(resolver.project_sources().unwrap().is_empty());
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("a.c")));
        assert!(is_source_file(Path::new("a.cpp")));
        assert!(is_source_file(Path::new("a.S")));
        assert!(!is_source_file(Path::new("a.h")));
        assert!(!is_source_file(Path::new("Makefile")));
    }
}
