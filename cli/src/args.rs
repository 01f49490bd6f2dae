use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use spc2wav_core::{ACCURATE_AMP, DEFAULT_AMP};

const AMP_FLAG: &str = "--amp";

/// Flags handed to clap as-is. Every other dashed token is a file name.
const PASSTHROUGH: [&str; 4] = ["-h", "--help", "-V", "--version"];

/// Input and output; further positionals are ignored.
const POSITIONALS: usize = 2;

#[derive(Parser, Debug)]
#[command(
    name = "spc2wav",
    version,
    about = "Render an SPC capture to a 32 kHz stereo WAV file",
    after_help = notes()
)]
pub struct Args {
    /// Output amplitude
    #[arg(long, value_name = "AMPLITUDE", default_value_t = DEFAULT_AMP, value_parser = parse_amp)]
    pub amp: u32,

    /// SPC file to render
    pub input: PathBuf,

    /// Destination; defaults to the input name with a .wav extension
    pub output: Option<PathBuf>,
}

impl Args {
    /// Parses the process arguments, exiting with status 1 on a usage error.
    pub fn parse_or_exit() -> Args {
        match Args::try_parse_from(normalize(std::env::args_os())) {
            Ok(args) => args,
            Err(err) => {
                let _ = err.print();
                if !err.use_stderr() {
                    std::process::exit(0);
                }
                if !err.render().to_string().contains("Usage:") {
                    eprintln!("\n{}", Args::command().render_usage());
                }
                eprintln!("{}", amp_levels());
                std::process::exit(1);
            }
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derive_output_path(&self.input))
    }
}

fn amp_levels() -> String {
    format!("  \"Accurate\" SNES amplitude = {ACCURATE_AMP}\n  Default = {DEFAULT_AMP}")
}

fn notes() -> String {
    if cfg!(feature = "snes-spc") {
        amp_levels()
    } else {
        format!(
            "{}\n\nThis build has no synthesis engine. Rebuild with `--features snes-spc` to render.",
            amp_levels()
        )
    }
}

/// Reads the leading decimal digits of `value`. Zero, including input with
/// no leading digit, is not a usable amplitude.
pub fn parse_amp(value: &str) -> Result<u32, String> {
    let amp = value
        .bytes()
        .take_while(u8::is_ascii_digit)
        .try_fold(0u32, |n, d| n.checked_mul(10)?.checked_add(u32::from(d - b'0')));

    match amp {
        Some(0) => Err(format!("invalid amplitude '{value}'")),
        Some(amp) => Ok(amp),
        None => Err(format!("amplitude '{value}' is too large")),
    }
}

/// Rewrites any option that starts with `--amp`, in any case, to
/// `--amp=VALUE`.
///
/// Option scanning stops at `--` or at the first token that is neither an
/// `--amp` option nor a help or version flag. A `--` is inserted there so
/// the input and output names are never read as options.
pub fn normalize<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    let mut args = args.into_iter();
    let mut out: Vec<OsString> = args.next().into_iter().collect();
    let mut first = None;

    while let Some(arg) = args.next() {
        let text = arg.to_string_lossy().into_owned();
        if text == "--" {
            break;
        }
        if is_amp_flag(&text) {
            let value = match text.split_once('=') {
                Some((_, value)) => value.to_owned(),
                None => match args.next() {
                    Some(value) => value.to_string_lossy().into_owned(),
                    None => {
                        out.push(AMP_FLAG.into());
                        continue;
                    }
                },
            };
            out.push(format!("{AMP_FLAG}={value}").into());
            continue;
        }
        if PASSTHROUGH.contains(&text.as_str()) {
            out.push(arg);
            continue;
        }

        first = Some(arg);
        break;
    }

    out.push("--".into());
    out.extend(first.into_iter().chain(args).take(POSITIONALS));
    out
}

fn is_amp_flag(arg: &str) -> bool {
    arg.get(..AMP_FLAG.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(AMP_FLAG))
}

/// Replaces everything from the last `.` of the file name with `.wav`. A
/// name without a `.` gets `.wav` appended.
pub fn derive_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => &name[..],
    };
    input.with_file_name(format!("{stem}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        let argv = std::iter::once("spc2wav").chain(args.iter().copied()).map(OsString::from);
        Args::try_parse_from(normalize(argv))
    }

    #[test]
    fn amp_accepts_positive_integers() {
        assert_eq!(parse_amp("1"), Ok(1));
        assert_eq!(parse_amp("256"), Ok(256));
        assert_eq!(parse_amp("4294967295"), Ok(u32::MAX));
    }

    #[test]
    fn amp_stops_at_first_non_digit() {
        assert_eq!(parse_amp("300abc"), Ok(300));
        assert_eq!(parse_amp("12.5"), Ok(12));
    }

    #[test]
    fn amp_rejects_zero_and_non_numeric() {
        assert!(parse_amp("0").is_err());
        assert!(parse_amp("000").is_err());
        assert!(parse_amp("").is_err());
        assert!(parse_amp("abc").is_err());
        assert!(parse_amp("-5").is_err());
        assert!(parse_amp("4294967296").is_err());
    }

    #[test]
    fn default_amp() {
        let args = parse(&["song.spc"]).unwrap();
        assert_eq!(args.amp, DEFAULT_AMP);
        assert_eq!(args.input, PathBuf::from("song.spc"));
        assert_eq!(args.output, None);
    }

    #[test]
    fn amp_flag_forms() {
        assert_eq!(parse(&["--amp", "256", "a.spc"]).unwrap().amp, 256);
        assert_eq!(parse(&["--amp=512", "a.spc"]).unwrap().amp, 512);
        assert_eq!(parse(&["--AMP=128", "a.spc"]).unwrap().amp, 128);
        assert_eq!(parse(&["--Amplitude", "64", "a.spc"]).unwrap().amp, 64);
    }

    #[test]
    fn bad_amp_is_a_usage_error() {
        assert!(parse(&["--amp", "0", "a.spc"]).is_err());
        assert!(parse(&["--amp=x", "a.spc"]).is_err());
    }

    #[test]
    fn explicit_output() {
        let args = parse(&["in.spc", "out/render.wav"]).unwrap();
        assert_eq!(args.output_path(), PathBuf::from("out/render.wav"));
    }

    #[test]
    fn double_dash_ends_options() {
        let args = parse(&["--", "--amp.spc"]).unwrap();
        assert_eq!(args.amp, DEFAULT_AMP);
        assert_eq!(args.input, PathBuf::from("--amp.spc"));
    }

    #[test]
    fn options_end_at_first_positional() {
        let args = parse(&["in.spc", "--amp=3"]).unwrap();
        assert_eq!(args.amp, DEFAULT_AMP);
        assert_eq!(args.output, Some(PathBuf::from("--amp=3")));
    }

    #[test]
    fn dashed_names_are_files() {
        let args = parse(&["-foo.spc"]).unwrap();
        assert_eq!(args.input, PathBuf::from("-foo.spc"));

        let args = parse(&["--amp", "256", "--bogus", "-"]).unwrap();
        assert_eq!(args.amp, 256);
        assert_eq!(args.input, PathBuf::from("--bogus"));
        assert_eq!(args.output, Some(PathBuf::from("-")));
    }

    #[test]
    fn extra_positionals_are_ignored() {
        let args = parse(&["a.spc", "b.wav", "c", "d"]).unwrap();
        assert_eq!(args.input, PathBuf::from("a.spc"));
        assert_eq!(args.output, Some(PathBuf::from("b.wav")));
    }

    #[test]
    fn help_and_version_reach_clap() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        let err = parse(&["-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn amp_levels_come_from_the_constants() {
        let levels = amp_levels();
        assert!(levels.contains("amplitude = 256"));
        assert!(levels.contains("Default = 384"));
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--amp", "256"]).is_err());
    }

    #[test]
    fn output_path_strips_last_extension() {
        assert_eq!(derive_output_path(Path::new("song.spc")), PathBuf::from("song.wav"));
        assert_eq!(
            derive_output_path(Path::new("archive.tar.spc")),
            PathBuf::from("archive.tar.wav")
        );
        assert_eq!(
            derive_output_path(Path::new("rips/v1.2/track")),
            PathBuf::from("rips/v1.2/track.wav")
        );
    }

    #[test]
    fn output_path_without_extension() {
        assert_eq!(derive_output_path(Path::new("song")), PathBuf::from("song.wav"));
        assert_eq!(derive_output_path(Path::new(".spc")), PathBuf::from(".wav"));
    }
}
