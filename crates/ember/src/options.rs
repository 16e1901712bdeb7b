//! Command-line options for the preview driver.

use std::path::PathBuf;

use ember_effects::{EmberError, EmberResult};

/// Usage text printed for `--help` and after argument errors.
pub const USAGE: &str = "\
usage: ember_preview [CONFIG.toml] [options]

options:
  --size WxH       container size in logical pixels (default 640x360)
  --dpr RATIO      device pixel ratio (default 1)
  --frames N       frames to simulate at 60 Hz (default 120)
  --resize WxH     resize the container halfway through the run
  --seed N         override the config's seed
  --out FILE.png   output image (default ember_preview.png)
  --help           print this text

Logging follows RUST_LOG, e.g. RUST_LOG=ember_effects=debug.";

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// Run a preview.
    Run(PreviewOptions),
    /// Print usage and exit.
    Help,
}

/// One preview run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOptions {
    /// Effect file; the default Border Glow when absent.
    pub config: Option<PathBuf>,
    /// Container size in logical pixels.
    pub size: (f32, f32),
    /// Device pixel ratio.
    pub device_pixel_ratio: f32,
    /// Frames to simulate.
    pub frames: u32,
    /// Size applied halfway through the run.
    pub resize: Option<(f32, f32)>,
    /// Seed override.
    pub seed: Option<u64>,
    /// Output image path.
    pub out: PathBuf,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            config: None,
            size: (640.0, 360.0),
            device_pixel_ratio: 1.0,
            frames: 120,
            resize: None,
            seed: None,
            out: PathBuf::from("ember_preview.png"),
        }
    }
}

impl Invocation {
    /// Parses arguments, excluding the program name.
    ///
    /// # Errors
    ///
    /// Returns [`EmberError::InvalidConfig`] for unknown flags, missing
    /// values, or values that do not parse.
    pub fn parse<I>(args: I) -> EmberResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = PreviewOptions::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Self::Help),
                "--size" => options.size = parse_size(&value(&mut args, "--size")?)?,
                "--dpr" => options.device_pixel_ratio = parse_number(&value(&mut args, "--dpr")?, "--dpr")?,
                "--frames" => options.frames = parse_number(&value(&mut args, "--frames")?, "--frames")?,
                "--resize" => options.resize = Some(parse_size(&value(&mut args, "--resize")?)?),
                "--seed" => options.seed = Some(parse_number(&value(&mut args, "--seed")?, "--seed")?),
                "--out" => options.out = PathBuf::from(value(&mut args, "--out")?),
                flag if flag.starts_with("--") => {
                    return Err(EmberError::InvalidConfig(format!("unknown option {flag}")));
                }
                path => {
                    if options.config.is_some() {
                        return Err(EmberError::InvalidConfig(format!("unexpected argument {path}")));
                    }
                    options.config = Some(PathBuf::from(path));
                }
            }
        }
        Ok(Self::Run(options))
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> EmberResult<String> {
    args.next()
        .ok_or_else(|| EmberError::InvalidConfig(format!("{flag} needs a value")))
}

fn parse_number<T: std::str::FromStr>(text: &str, flag: &str) -> EmberResult<T> {
    text.parse()
        .map_err(|_| EmberError::InvalidConfig(format!("{flag}: cannot parse {text:?}")))
}

/// Parses `WxH`; both sides must be finite and non-negative.
fn parse_size(text: &str) -> EmberResult<(f32, f32)> {
    let invalid = || EmberError::InvalidConfig(format!("size {text:?} is not WxH"));
    let (w, h) = text.split_once(['x', 'X']).ok_or_else(invalid)?;
    let w: f32 = w.trim().parse().map_err(|_| invalid())?;
    let h: f32 = h.trim().parse().map_err(|_| invalid())?;
    if !(w.is_finite() && h.is_finite()) || w < 0.0 || h < 0.0 {
        return Err(invalid());
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> EmberResult<Invocation> {
        Invocation::parse(args.iter().map(ToString::to_string))
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse(&[]).unwrap(), Invocation::Run(PreviewOptions::default()));
    }

    #[test]
    fn test_full_command_line() {
        let Invocation::Run(options) = parse(&[
            "data/effects/beam_oscillator.toml",
            "--size",
            "320x180",
            "--dpr",
            "2",
            "--frames",
            "30",
            "--resize",
            "400X200",
            "--seed",
            "99",
            "--out",
            "beams.png",
        ])
        .unwrap() else {
            panic!("expected a run");
        };
        assert_eq!(options.config, Some(PathBuf::from("data/effects/beam_oscillator.toml")));
        assert_eq!(options.size, (320.0, 180.0));
        assert_eq!(options.device_pixel_ratio, 2.0);
        assert_eq!(options.frames, 30);
        assert_eq!(options.resize, Some((400.0, 200.0)));
        assert_eq!(options.seed, Some(99));
        assert_eq!(options.out, PathBuf::from("beams.png"));
    }

    #[test]
    fn test_help_wins() {
        assert_eq!(parse(&["--frames", "3", "--help"]).unwrap(), Invocation::Help);
    }

    #[test]
    fn test_bad_arguments_are_invalid_config() {
        for args in [
            &["--size", "wide"][..],
            &["--size", "-1x10"][..],
            &["--frames"][..],
            &["--frames", "-3"][..],
            &["--bogus"][..],
            &["a.toml", "b.toml"][..],
        ] {
            assert!(
                matches!(parse(args), Err(EmberError::InvalidConfig(_))),
                "{args:?}"
            );
        }
    }
}
