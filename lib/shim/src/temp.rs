use crate::error::Result;
use crate::value::Object;
use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 10;

/// Options accepted by `makeTempDir` and `makeTempFile`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TempOptions {
    pub dir: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl TempOptions {
    pub fn from_object(options: Option<&Object>) -> Result<Self> {
        let Some(options) = options else {
            return Ok(Self::default());
        };
        Ok(Self {
            dir: options.opt_str("dir")?.map(str::to_owned),
            prefix: options.opt_str("prefix")?.map(str::to_owned),
            suffix: options.opt_str("suffix")?.map(str::to_owned),
        })
    }
}

/// `{dir}/{prefix}{random}{suffix}`, where `dir` falls back to `default_dir`.
pub fn temp_path(default_dir: &str, options: &TempOptions) -> String {
    let dir = options.dir.as_deref().unwrap_or(default_dir);
    let dir = dir.trim_end_matches('/');
    format!(
        "{dir}/{}{}{}",
        options.prefix.as_deref().unwrap_or(""),
        random_suffix(),
        options.suffix.as_deref().unwrap_or(""),
    )
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}
