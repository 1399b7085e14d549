use tracing_log::log::debug;

use crate::VmConfig;
use crate::class_path::Classpath;
use crate::error::JvmError;

/// Byte-loading facade over the three-band classpath. Class-file lookup
/// and the verbose load log live here; parsing and linking are the
/// method area's business.
pub struct ClassLoader {
    class_path: Classpath,
}

impl ClassLoader {
    pub fn new(config: &VmConfig) -> Result<ClassLoader, JvmError> {
        debug!("creating class loader from classpath {:?}", config.class_path);
        let class_path =
            Classpath::parse(config.jre_path.as_deref(), config.class_path.as_deref())?;
        Ok(ClassLoader { class_path })
    }

    /// First successful read across the bands; the origin tag feeds the
    /// `--verbose-class` log only.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, JvmError> {
        let (data, origin) = self.class_path.read_class(name)?;
        debug!("[Loaded {name} from {origin}]");
        Ok(data)
    }
}
