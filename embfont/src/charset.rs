/*!
Character-set resolution.

A font config names one or more character-set sources; resolving them
yields the ascending, deduplicated list of code points to render. The
container format is 16-bit only, so every source is bounded to
`0x0000..=0xFFFF`.
*/

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use serde_derive::{Deserialize, Serialize};

use crate::Error;

/**
One source of code points.

The JSON spelling is `{"type": "...", "value": "..."}`:

```json
[
    { "type": "range", "value": "0x0020-0x007F" },
    { "type": "string", "value": "°µ" },
    { "type": "file", "value": "cjk-subset.cst" }
]
```
*/
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CharsetSource {
    /// A `.cst` file: consecutive little-endian u16 code points.
    File(PathBuf),
    /// A `"0xHHHH-0xHHHH"` range, both bounds inclusive.
    Range(String),
    /// A codepage definition file. Accepted by the parser, rejected at
    /// resolution; see [`resolve`].
    Codepage(PathBuf),
    /// The code points of a literal string. Scalars above U+FFFF are
    /// skipped.
    String(String),
}

/**
Merge `sources` into a sorted, deduplicated code point list.

Relative file paths are taken relative to `base` (the config file's
directory). An overall empty result is a configuration error: a font
with nothing to render was asked for.
*/
pub fn resolve(sources: &[CharsetSource], base: &Path) -> Result<Vec<u16>, Error> {
    let mut set: BTreeSet<u16> = BTreeSet::new();

    for source in sources {
        match source {
            CharsetSource::Range(text) => {
                let (lo, hi) = parse_range(text)?;
                for cp in lo..=hi {
                    set.insert(cp);
                }
            }
            CharsetSource::File(path) => {
                let path = join_base(base, path);
                let bytes = match std::fs::read(&path) {
                    Ok(b) => b,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Err(Error::CharsetFileMissing(path));
                    }
                    Err(e) => {
                        return Err(Error::CharsetParseError(format!(
                            "cannot read {}: {}",
                            path.display(),
                            e
                        )));
                    }
                };
                for cp in parse_cst(&bytes)? {
                    set.insert(cp);
                }
            }
            CharsetSource::String(text) => {
                for c in text.chars() {
                    if let Ok(cp) = u16::try_from(c as u32) {
                        set.insert(cp);
                    }
                }
            }
            CharsetSource::Codepage(path) => {
                return Err(Error::CodepageUnsupported(join_base(base, path)));
            }
        }
    }

    if set.is_empty() {
        return Err(Error::ConfigValidation(
            "character sets resolve to no code points".to_string(),
        ));
    }

    Ok(set.into_iter().collect())
}

/// Decode a `.cst` byte run: consecutive little-endian u16 code points.
pub fn parse_cst(bytes: &[u8]) -> Result<Vec<u16>, Error> {
    if bytes.len() % 2 != 0 {
        return Err(Error::CharsetParseError(format!(
            "odd length {}; expected consecutive 16-bit code points",
            bytes.len()
        )));
    }
    Ok(bytes.chunks_exact(2).map(LittleEndian::read_u16).collect())
}

/**
Parse a `"0xHHHH-0xHHHH"` range string.

Hex digits are case-insensitive and the `0x` prefix is optional on
either bound. The bounds must be ordered and within `0x0000..=0xFFFF`.
*/
fn parse_range(text: &str) -> Result<(u16, u16), Error> {
    let bad = || Error::InvalidRange(text.to_string());

    let mut parts = text.split('-');
    let (lo, hi) = match (parts.next(), parts.next(), parts.next()) {
        (Some(lo), Some(hi), None) => (lo, hi),
        _ => {
            return Err(bad());
        }
    };

    let lo = parse_bound(lo).ok_or_else(|| bad())?;
    let hi = parse_bound(hi).ok_or_else(|| bad())?;
    if lo > hi {
        return Err(bad());
    }
    Ok((lo, hi))
}

fn parse_bound(text: &str) -> Option<u16> {
    let digits = text
        .trim()
        .strip_prefix("0x")
        .or_else(|| text.trim().strip_prefix("0X"))
        .unwrap_or_else(|| text.trim());
    let value = u32::from_str_radix(digits, 16).ok()?;
    u16::try_from(value).ok()
}

fn join_base(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(text: &str) -> CharsetSource {
        CharsetSource::Range(text.to_string())
    }

    #[test]
    fn range_strings() {
        assert_eq!(parse_range("0x0041-0x0046").unwrap(), (0x41, 0x46));
        assert_eq!(parse_range("0X00a0-00FF").unwrap(), (0xA0, 0xFF));
        assert_eq!(parse_range("20-20").unwrap(), (0x20, 0x20));

        for bad in [
            "0x0046-0x0041", // reversed
            "0x10000-0x10001",
            "0x41",
            "0x41-0x42-0x43",
            "fish-0x42",
            "",
        ] {
            assert!(parse_range(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn merged_sorted_deduplicated() {
        let sources = vec![
            range("0x0043-0x0045"),
            CharsetSource::String("AB C".to_string()),
            range("0x0041-0x0042"),
        ];
        let cps = resolve(&sources, Path::new(".")).unwrap();
        assert_eq!(cps, vec![0x20, 0x41, 0x42, 0x43, 0x44, 0x45]);
    }

    #[test]
    fn string_skips_astral_scalars() {
        let sources = vec![CharsetSource::String("a\u{1F600}b".to_string())];
        let cps = resolve(&sources, Path::new(".")).unwrap();
        assert_eq!(cps, vec![0x61, 0x62]);
    }

    #[test]
    fn cst_bytes() {
        assert_eq!(
            parse_cst(&[0x41, 0x00, 0x34, 0x12]).unwrap(),
            vec![0x0041, 0x1234]
        );
        assert_eq!(parse_cst(&[]).unwrap(), Vec::<u16>::new());
        assert!(parse_cst(&[0x41]).is_err());
    }

    #[test]
    fn file_source() {
        let dir = std::env::temp_dir();
        let path = dir.join("embfont_charset_test.cst");
        std::fs::write(&path, [0x42u8, 0x00, 0x41, 0x00]).unwrap();

        let sources = vec![CharsetSource::File(path.clone())];
        let cps = resolve(&sources, Path::new("/nonexistent-base")).unwrap();
        assert_eq!(cps, vec![0x41, 0x42]);

        std::fs::remove_file(&path).unwrap();

        match resolve(&sources, Path::new(".")) {
            Err(Error::CharsetFileMissing(p)) => assert_eq!(p, path),
            other => panic!("expected CharsetFileMissing, got {:?}", other),
        }
    }

    #[test]
    fn codepage_is_rejected() {
        let sources = vec![CharsetSource::Codepage(PathBuf::from("cp936.txt"))];
        assert!(matches!(
            resolve(&sources, Path::new(".")),
            Err(Error::CodepageUnsupported(_))
        ));
    }

    #[test]
    fn empty_result_is_a_config_error() {
        let sources = vec![CharsetSource::String(String::new())];
        assert!(matches!(
            resolve(&sources, Path::new(".")),
            Err(Error::ConfigValidation(_))
        ));
        assert!(matches!(
            resolve(&[], Path::new(".")),
            Err(Error::ConfigValidation(_))
        ));
    }

    #[test]
    fn source_json_spelling() {
        let json = r#"[
            { "type": "range", "value": "0x0041-0x0046" },
            { "type": "file", "value": "chars.cst" },
            { "type": "string", "value": "abc" },
            { "type": "codepage", "value": "cp936.txt" }
        ]"#;
        let sources: Vec<CharsetSource> = serde_json::from_str(json).unwrap();
        assert!(matches!(&sources[0], CharsetSource::Range(s) if s == "0x0041-0x0046"));
        assert!(matches!(&sources[1], CharsetSource::File(_)));
        assert!(matches!(&sources[2], CharsetSource::String(s) if s == "abc"));
        assert!(matches!(&sources[3], CharsetSource::Codepage(_)));
    }
}
