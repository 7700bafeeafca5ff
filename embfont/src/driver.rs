/*!
Per-config orchestration.

For each font config the driver loads the font, resolves the character
sets, runs the matching encoder, and writes the container plus its
sidecars. Every file the run creates is tracked; if anything aborts the
run, the tracked files are removed before the error surfaces, so a
failed run leaves no half-written output behind.
*/

use crate::charset;
use crate::config::{FontConfig, OutputFormat};
use crate::generate::{
    self, bitmap, vector, EncodedFont, Outputs, FAILED_CHARS_FILE,
};
use crate::outline::{FontFile, OutlineSource};
use crate::Error;

/// Run every font config in order, stopping at the first failure.
pub fn run_all(configs: &[FontConfig]) -> Result<(), Error> {
    for config in configs {
        run(config)?;
    }
    Ok(())
}

/**
Convert one font according to its config.

Writes the container, the `.cst` sidecar, and (only if some code points
failed to render) the failed-characters report into the config's output
directory.
*/
pub fn run(config: &FontConfig) -> Result<(), Error> {
    config.validate()?;
    let font = FontFile::load(&config.font_path)?;

    let mut outputs = Outputs::new();
    let result = generate_outputs(&font, font.name(), config, &mut outputs);
    if result.is_err() {
        outputs.cleanup();
    }
    result
}

fn generate_outputs<S: OutlineSource>(
    source: &S,
    font_name: &str,
    config: &FontConfig,
    outputs: &mut Outputs,
) -> Result<(), Error> {
    let code_points = charset::resolve(&config.character_sets, &config.base_dir)?;
    log::info!(
        "{}: {} code points at size {}",
        font_name,
        code_points.len(),
        config.font_size
    );

    let (stem, encoded): (String, EncodedFont) = match config.output_format {
        OutputFormat::Bitmap => (
            generate::bitmap_file_stem(font_name, config.font_size, config.render_mode),
            bitmap::encode(source, font_name, config, &code_points)?,
        ),
        OutputFormat::Vector => (
            generate::vector_file_stem(font_name),
            vector::encode(source, font_name, config, &code_points)?,
        ),
    };

    generate::ensure_output_dir(&config.output_path)?;

    let bin_path = config.output_path.join(format!("{}.bin", stem));
    outputs.write_file(&bin_path, &encoded.container)?;

    let cst_path = config.output_path.join(format!("{}.cst", stem));
    outputs.write_file(&cst_path, &generate::charset_bytes(&encoded.accepted))?;

    if !encoded.failed.is_empty() {
        let report_path = config.output_path.join(FAILED_CHARS_FILE);
        outputs.write_file(
            &report_path,
            generate::failed_chars_report(&encoded.failed).as_bytes(),
        )?;
        log::warn!(
            "{}: {} code points were not renderable; see {}",
            font_name,
            encoded.failed.len(),
            report_path.display()
        );
    }

    log::info!(
        "{}: wrote {} ({} glyphs, {} bytes)",
        font_name,
        bin_path.display(),
        encoded.accepted.len(),
        encoded.container.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::CharsetSource;
    use crate::config::{IndexMethod, Rotation};
    use crate::generate::testutil::SquareSource;
    use std::path::{Path, PathBuf};

    fn temp_out(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("embfont_driver_{}", tag))
    }

    fn test_config(out: &Path) -> FontConfig {
        FontConfig {
            font_path: PathBuf::from("font.ttf"),
            output_path: out.to_path_buf(),
            font_size: 16,
            output_format: OutputFormat::Bitmap,
            render_mode: 4,
            bold: false,
            italic: false,
            rotation: Rotation::None,
            gamma: 1.0,
            index_method: IndexMethod::Address,
            crop: false,
            character_sets: vec![CharsetSource::Range("0x0041-0x0046".to_string())],
            base_dir: PathBuf::new(),
        }
    }

    #[test]
    fn writes_container_and_sidecars() {
        let out = temp_out("ok");
        let _ = std::fs::remove_dir_all(&out);
        let config = test_config(&out);
        let source = SquareSource::new(0x41..=0x44);

        let mut outputs = Outputs::new();
        generate_outputs(&source, "Stub", &config, &mut outputs).unwrap();

        let bin = out.join("Stub_size16_bits4_bitmap.bin");
        let cst = out.join("Stub_size16_bits4_bitmap.cst");
        let report = out.join(FAILED_CHARS_FILE);
        assert!(bin.is_file());
        assert!(cst.is_file());
        // 0x45 and 0x46 are not covered by the stub
        assert_eq!(
            std::fs::read_to_string(&report).unwrap(),
            "U+0045\nU+0046\n"
        );
        assert_eq!(
            std::fs::read(&cst).unwrap(),
            vec![0x41, 0, 0x42, 0, 0x43, 0, 0x44, 0]
        );
        assert_eq!(outputs.paths().len(), 3);

        std::fs::remove_dir_all(&out).unwrap();
    }

    #[test]
    fn no_failures_means_no_report() {
        let out = temp_out("clean");
        let _ = std::fs::remove_dir_all(&out);
        let config = test_config(&out);
        let source = SquareSource::new(0x41..=0x46);

        let mut outputs = Outputs::new();
        generate_outputs(&source, "Stub", &config, &mut outputs).unwrap();
        assert!(!out.join(FAILED_CHARS_FILE).exists());

        std::fs::remove_dir_all(&out).unwrap();
    }

    #[test]
    fn vector_configs_use_vector_naming() {
        let out = temp_out("vec");
        let _ = std::fs::remove_dir_all(&out);
        let mut config = test_config(&out);
        config.output_format = OutputFormat::Vector;
        config.index_method = IndexMethod::Offset;
        let source = SquareSource::new(0x41..=0x46);

        let mut outputs = Outputs::new();
        generate_outputs(&source, "Stub", &config, &mut outputs).unwrap();
        assert!(out.join("Stub_vector.bin").is_file());
        assert!(out.join("Stub_vector.cst").is_file());

        std::fs::remove_dir_all(&out).unwrap();
    }

    #[test]
    fn invalid_combination_creates_nothing() {
        let out = temp_out("invalid");
        let _ = std::fs::remove_dir_all(&out);
        let mut config = test_config(&out);
        config.crop = true;
        config.index_method = IndexMethod::Offset;

        match run(&config) {
            Err(Error::ConfigValidation(_)) => {}
            other => panic!("expected ConfigValidation, got {:?}", other),
        }
        assert!(!out.exists());
    }

    #[test]
    fn missing_font_file_reports_its_path() {
        let out = temp_out("nofont");
        let config = test_config(&out);
        match run(&config) {
            Err(Error::FileNotFound(p)) => assert_eq!(p, PathBuf::from("font.ttf")),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
        assert!(!out.exists());
    }

    #[test]
    fn cleanup_removes_tracked_files() {
        let out = temp_out("cleanup");
        let _ = std::fs::remove_dir_all(&out);
        std::fs::create_dir_all(&out).unwrap();

        let mut outputs = Outputs::new();
        let a = out.join("a.bin");
        let b = out.join("b.cst");
        outputs.write_file(&a, &[1, 2, 3]).unwrap();
        outputs.write_file(&b, &[4]).unwrap();
        assert!(a.is_file() && b.is_file());

        outputs.cleanup();
        assert!(!a.exists() && !b.exists());

        std::fs::remove_dir_all(&out).unwrap();
    }

    #[test]
    fn charset_errors_surface_before_any_write() {
        let out = temp_out("badcharset");
        let _ = std::fs::remove_dir_all(&out);
        let mut config = test_config(&out);
        config.character_sets = vec![CharsetSource::Range("backwards".to_string())];
        let source = SquareSource::new(0x41..=0x46);

        let mut outputs = Outputs::new();
        match generate_outputs(&source, "Stub", &config, &mut outputs) {
            Err(Error::InvalidRange(_)) => {}
            other => panic!("expected InvalidRange, got {:?}", other),
        }
        assert!(outputs.paths().is_empty());
        assert!(!out.exists());
    }
}
