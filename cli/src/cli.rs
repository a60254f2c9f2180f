use std::path::PathBuf;

use clap::Parser;

use image_reducer_core::config::{default_output_folder, DEFAULT_QUALITY, MAX_QUALITY, MIN_QUALITY};
use image_reducer_core::{BatchConfig, EncodingStrategy};

/// Reduce the size of every image in a folder, losslessly or at a chosen quality
#[derive(Debug, Parser)]
#[command(name = "image_reducer", version, about)]
pub struct Cli {
    /// Folder containing the images (jpg, jpeg, png, webp, bmp, tiff)
    pub input: PathBuf,

    /// Output folder (default: <INPUT>/reduced_images)
    pub output: Option<PathBuf>,

    /// Re-encode at --quality instead of lossless optimization. PNGs are
    /// reduced to a color palette, which drops colors; BMP and TIFF stay lossless
    #[arg(short, long)]
    pub lossy: bool,

    /// Quality for --lossy; values outside 10–95 are clamped
    #[arg(short, long, default_value_t = DEFAULT_QUALITY as u32)]
    pub quality: u32,

    /// Show what would be done without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn strategy(&self) -> EncodingStrategy {
        if self.lossy {
            EncodingStrategy::quality_reduced(self.quality as i64)
        } else {
            EncodingStrategy::Lossless
        }
    }

    /// True when `--lossy` was given with a quality that will be clamped.
    pub fn quality_out_of_range(&self) -> bool {
        self.lossy && !(MIN_QUALITY as u32..=MAX_QUALITY as u32).contains(&self.quality)
    }

    pub fn output_folder(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_folder(&self.input))
    }

    pub fn to_config(&self) -> BatchConfig {
        BatchConfig::new(self.input.clone(), self.output_folder(), self.strategy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_lossless_and_reduced_images() {
        let cli = Cli::try_parse_from(["image_reducer", "/photos"]).unwrap();
        assert_eq!(cli.strategy(), EncodingStrategy::Lossless);
        assert_eq!(cli.output_folder(), PathBuf::from("/photos/reduced_images"));
        assert!(!cli.quality_out_of_range());
    }

    #[test]
    fn test_lossy_with_quality() {
        let cli = Cli::try_parse_from(["image_reducer", "/in", "/out", "--lossy", "-q", "60"]).unwrap();
        assert_eq!(cli.strategy(), EncodingStrategy::quality_reduced(60));

        let config = cli.to_config();
        assert_eq!(config.input_folder, PathBuf::from("/in"));
        assert_eq!(config.output_folder, PathBuf::from("/out"));
    }

    #[test]
    fn test_lossy_default_quality_is_85() {
        let cli = Cli::try_parse_from(["image_reducer", "/in", "--lossy"]).unwrap();
        assert_eq!(cli.strategy(), EncodingStrategy::quality_reduced(85));
    }

    #[test]
    fn test_quality_clamped() {
        let cli = Cli::try_parse_from(["image_reducer", "/in", "--lossy", "--quality", "100"]).unwrap();
        assert!(cli.quality_out_of_range());
        assert_eq!(cli.strategy(), EncodingStrategy::quality_reduced(95));

        let cli = Cli::try_parse_from(["image_reducer", "/in", "--lossy", "--quality", "2"]).unwrap();
        assert_eq!(cli.strategy(), EncodingStrategy::quality_reduced(10));
    }

    #[test]
    fn test_quality_ignored_without_lossy() {
        let cli = Cli::try_parse_from(["image_reducer", "/in", "--quality", "300"]).unwrap();
        assert_eq!(cli.strategy(), EncodingStrategy::Lossless);
        assert!(!cli.quality_out_of_range());
    }

    #[test]
    fn test_lossy_help_mentions_png_palette() {
        use clap::CommandFactory;

        let command = Cli::command();
        let lossy = command
            .get_arguments()
            .find(|arg| arg.get_id() == "lossy")
            .unwrap();
        let help = lossy.get_long_help().or(lossy.get_help()).unwrap().to_string();
        assert!(help.contains("palette"), "{help}");
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["image_reducer"]).is_err());
    }
}
