use std::env;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing_log::log::warn;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::JvmError;
use crate::throw_exception;

/// Separator of classpath lists handed to `--classpath`.
const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// One classpath member: a directory of class files, an archive, or an
/// ordered union of either (wildcard expansion). Archives are opened on
/// first use and stay open for the process lifetime.
pub enum Entry {
    Dir(PathBuf),
    Zip { path: PathBuf, archive: Option<ZipArchive<BufReader<File>>> },
    Composite(Vec<Entry>),
}

impl Entry {
    pub fn new(path: &str) -> Entry {
        if path.contains(PATH_LIST_SEPARATOR) {
            let members = path
                .split(PATH_LIST_SEPARATOR)
                .filter(|member| !member.is_empty())
                .map(Entry::new)
                .collect();
            return Entry::Composite(members);
        }
        if let Some(base) = path.strip_suffix('*') {
            return Entry::wildcard(Path::new(base));
        }
        let lowered = path.to_ascii_lowercase();
        if lowered.ends_with(".jar") || lowered.ends_with(".zip") {
            return Entry::Zip { path: PathBuf::from(path), archive: None };
        }
        Entry::Dir(PathBuf::from(path))
    }

    /// Expands `<dir>/*` into the archives directly inside `<dir>`, in
    /// enumeration order.
    pub fn wildcard(base: &Path) -> Entry {
        let mut members = Vec::new();
        for entry in WalkDir::new(base).min_depth(1).max_depth(1).sort_by_file_name() {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            let is_jar = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"));
            if is_jar {
                members.push(Entry::Zip { path: path.to_path_buf(), archive: None });
            }
        }
        Entry::Composite(members)
    }

    /// Reads `<file_name>` (an internal name plus `.class`) from this
    /// entry. `None` when the entry does not hold the class.
    fn read_class(&mut self, file_name: &str) -> Option<Vec<u8>> {
        match self {
            Entry::Dir(dir) => {
                let mut data = Vec::new();
                File::open(dir.join(file_name)).ok()?.read_to_end(&mut data).ok()?;
                Some(data)
            }
            Entry::Zip { path, archive } => {
                if archive.is_none() {
                    let file = File::open(&*path).ok()?;
                    match ZipArchive::new(BufReader::new(file)) {
                        Ok(opened) => *archive = Some(opened),
                        Err(error) => {
                            warn!("ignoring unreadable archive {}: {error}", path.display());
                            return None;
                        }
                    }
                }
                let mut entry = archive.as_mut()?.by_name(file_name).ok()?;
                let mut data = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut data).ok()?;
                Some(data)
            }
            Entry::Composite(members) => {
                members.iter_mut().find_map(|member| member.read_class(file_name))
            }
        }
    }

    /// Origin tag carried for verbose load logging only.
    fn describe(&self) -> String {
        match self {
            Entry::Dir(dir) => dir.display().to_string(),
            Entry::Zip { path, .. } => path.display().to_string(),
            Entry::Composite(members) => {
                let names: Vec<String> = members.iter().map(Entry::describe).collect();
                names.join(if cfg!(windows) { ";" } else { ":" })
            }
        }
    }

    fn describe_containing(&mut self, file_name: &str) -> Option<String> {
        match self {
            Entry::Composite(members) => members.iter_mut().find_map(|member| {
                member.read_class(file_name).is_some().then(|| member.describe())
            }),
            _ => Some(self.describe()),
        }
    }
}

/// Ordered three-band search: bootstrap (`<jre>/lib/*`), extension
/// (`<jre>/lib/ext/*`), then the user path.
pub struct Classpath {
    boot: Entry,
    ext: Entry,
    user: Entry,
}

impl Classpath {
    pub fn parse(
        jre_option: Option<&Path>,
        cp_option: Option<&str>,
    ) -> Result<Classpath, JvmError> {
        let jre_dir = find_jre_dir(jre_option)?;
        Ok(Classpath {
            boot: Entry::wildcard(&jre_dir.join("lib")),
            ext: Entry::wildcard(&jre_dir.join("lib").join("ext")),
            user: Entry::new(cp_option.unwrap_or(".")),
        })
    }

    /// Reads the class bytes for an internal name, returning the origin
    /// tag of the entry that held it.
    pub fn read_class(&mut self, name: &str) -> Result<(Vec<u8>, String), JvmError> {
        let file_name = format!("{name}.class");
        for band in [&mut self.boot, &mut self.ext, &mut self.user] {
            if let Some(data) = band.read_class(&file_name) {
                let origin = band.describe_containing(&file_name).unwrap_or_default();
                return Ok((data, origin));
            }
        }
        throw_exception!(ClassNotFoundException, "{name}");
    }
}

/// JRE directory discovery: explicit override, `./jre`, `$JAVA_HOME/jre`.
fn find_jre_dir(jre_option: Option<&Path>) -> Result<PathBuf, JvmError> {
    if let Some(path) = jre_option {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
    }
    let local = PathBuf::from("./jre");
    if local.is_dir() {
        return Ok(local);
    }
    if let Ok(java_home) = env::var("JAVA_HOME") {
        let nested = PathBuf::from(java_home).join("jre");
        if nested.is_dir() {
            return Ok(nested);
        }
    }
    Err(JvmError::JreNotFound)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use super::*;
    use crate::error::{JavaExceptionKind, JvmError};

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn dir_entry_reads_by_internal_name() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("com/example");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("Main.class"), [0xCA, 0xFE]).unwrap();

        let mut entry = Entry::new(dir.path().to_str().unwrap());
        assert_eq!(entry.read_class("com/example/Main.class"), Some(vec![0xCA, 0xFE]));
        assert_eq!(entry.read_class("com/example/Other.class"), None);
    }

    #[test]
    fn zip_entry_reads_and_stays_open() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        write_jar(&jar, &[("A.class", b"aa"), ("b/B.class", b"bb")]);

        let mut entry = Entry::new(jar.to_str().unwrap());
        assert_eq!(entry.read_class("b/B.class"), Some(b"bb".to_vec()));
        assert_eq!(entry.read_class("A.class"), Some(b"aa".to_vec()));
        match entry {
            Entry::Zip { archive, .. } => assert!(archive.is_some()),
            _ => panic!("expected zip entry"),
        }
    }

    #[test]
    fn wildcard_expands_jars_and_composite_takes_first_hit() {
        let dir = tempfile::tempdir().unwrap();
        write_jar(&dir.path().join("a.jar"), &[("X.class", b"from-a")]);
        write_jar(&dir.path().join("b.jar"), &[("X.class", b"from-b"), ("Y.class", b"y")]);
        fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

        let mut entry = Entry::wildcard(dir.path());
        assert_eq!(entry.read_class("X.class"), Some(b"from-a".to_vec()));
        assert_eq!(entry.read_class("Y.class"), Some(b"y".to_vec()));
    }

    #[test]
    fn user_band_list_and_miss_reporting() {
        let jre = tempfile::tempdir().unwrap();
        fs::create_dir_all(jre.path().join("lib/ext")).unwrap();
        let classes = tempfile::tempdir().unwrap();
        fs::write(classes.path().join("Main.class"), b"m").unwrap();

        let list = format!(
            "{}{}{}",
            "missing-dir",
            PATH_LIST_SEPARATOR,
            classes.path().display()
        );
        let mut classpath = Classpath::parse(Some(jre.path()), Some(&list)).unwrap();
        let (data, origin) = classpath.read_class("Main").unwrap();
        assert_eq!(data, b"m".to_vec());
        assert_eq!(origin, classes.path().display().to_string());

        match classpath.read_class("Absent") {
            Err(JvmError::Exception(ex)) => {
                assert_eq!(ex.kind, JavaExceptionKind::ClassNotFoundException);
                assert_eq!(ex.message.as_deref(), Some("Absent"));
            }
            other => panic!("expected ClassNotFoundException, got {other:?}"),
        }
    }

    #[test]
    fn jre_discovery_fails_without_candidates() {
        // guard against an ambient ./jre or JAVA_HOME making this pass
        let missing = Path::new("/definitely/not/a/jre");
        if PathBuf::from("./jre").is_dir() || env::var("JAVA_HOME").is_ok() {
            return;
        }
        assert!(matches!(
            Classpath::parse(Some(missing), None),
            Err(JvmError::JreNotFound)
        ));
    }
}
