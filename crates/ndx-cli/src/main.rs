use std::ffi::OsString;
use std::io::{self, Write};

use ndx::{FileMode, NdxFile};

use crate::yaml::DumpScope;

mod yaml;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    container_path: Option<String>,
    scope: DumpScope,
    show_help: bool,
}

fn main() {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    let exit_code = run(std::env::args_os(), &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run<I, W, E>(args: I, out: &mut W, err: &mut E) -> i32
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(message) => {
            let _ = writeln!(err, "error: {message}");
            let _ = write_usage(err);
            return 2;
        }
    };

    if options.show_help {
        if write_usage(out).is_err() {
            return 1;
        }
        return 0;
    }

    let Some(path) = options.container_path else {
        let _ = writeln!(err, "error: missing container path");
        let _ = write_usage(err);
        return 2;
    };

    let file = match NdxFile::open(&path, FileMode::ReadOnly) {
        Ok(file) => file,
        Err(error) => {
            let _ = writeln!(err, "error: {error}");
            return 1;
        }
    };

    if let Err(error) = yaml::dump_file(out, &file, options.scope) {
        let _ = writeln!(err, "error: {error}");
        return 1;
    }
    0
}

fn parse_args<I>(args: I) -> Result<CliOptions, String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let _argv0 = iter.next();

    let mut container_path: Option<String> = None;
    let mut scope = DumpScope::All;
    let mut show_help = false;

    for argument in iter {
        let arg = argument.to_string_lossy();
        let arg_str = arg.as_ref();

        match arg_str {
            "-h" | "--help" => {
                show_help = true;
            }
            "-m" | "--metadata" => {
                if scope == DumpScope::Data {
                    return Err(String::from(
                        "`--metadata` cannot be combined with `--data`",
                    ));
                }
                scope = DumpScope::Metadata;
            }
            "-d" | "--data" => {
                if scope == DumpScope::Metadata {
                    return Err(String::from(
                        "`--data` cannot be combined with `--metadata`",
                    ));
                }
                scope = DumpScope::Data;
            }
            _ => {
                if arg_str.starts_with('-') {
                    return Err(format!("unknown option `{arg_str}`"));
                }
                if container_path.is_some() {
                    return Err(String::from(
                        "too many positional arguments; expected one container path",
                    ));
                }
                container_path = Some(arg_str.to_owned());
            }
        }
    }

    Ok(CliOptions {
        container_path,
        scope,
        show_help,
    })
}

fn write_usage<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Usage: ndx-dump [OPTIONS] <CONTAINER>")?;
    writeln!(out)?;
    writeln!(
        out,
        "Print a YAML-like report of an ndx container's contents."
    )?;
    writeln!(out)?;
    writeln!(out, "Options:")?;
    writeln!(out, "  -m, --metadata   print the metadata forest only")?;
    writeln!(out, "  -d, --data       print the blocks only")?;
    writeln!(out, "  -h, --help       print this help text")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndx::{Entity, Value};

    fn args(list: &[&str]) -> Vec<OsString> {
        std::iter::once("ndx-dump")
            .chain(list.iter().copied())
            .map(OsString::from)
            .collect()
    }

    fn run_captured(list: &[&str]) -> (i32, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run(args(list), &mut out, &mut err);
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn parse_defaults() {
        let options = parse_args(args(&["container.ndx"])).unwrap();
        assert_eq!(
            options,
            CliOptions {
                container_path: Some("container.ndx".to_owned()),
                scope: DumpScope::All,
                show_help: false,
            }
        );
    }

    #[test]
    fn parse_rejects_conflicting_scopes() {
        let err = parse_args(args(&["-m", "-d", "c.ndx"])).unwrap_err();
        assert!(err.contains("cannot be combined"));
    }

    #[test]
    fn parse_rejects_unknown_option() {
        let err = parse_args(args(&["--frobnicate"])).unwrap_err();
        assert!(err.contains("unknown option"));
    }

    #[test]
    fn parse_rejects_extra_positionals() {
        let err = parse_args(args(&["a.ndx", "b.ndx"])).unwrap_err();
        assert!(err.contains("too many positional"));
    }

    #[test]
    fn help_short_circuits() {
        let (code, out, _err) = run_captured(&["--help"]);
        assert_eq!(code, 0);
        assert!(out.contains("Usage: ndx-dump"));
    }

    #[test]
    fn missing_path_is_a_usage_error() {
        let (code, _out, err) = run_captured(&[]);
        assert_eq!(code, 2);
        assert!(err.contains("missing container path"));
    }

    #[test]
    fn missing_container_reports_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ndx");
        let (code, _out, err) = run_captured(&[path.to_str().unwrap()]);
        assert_eq!(code, 1);
        assert!(err.contains("unable to open container file"));
    }

    #[test]
    fn dumps_an_existing_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("container.ndx");
        {
            let file = NdxFile::open(&path, FileMode::ReadWrite).unwrap();
            let session = file.create_section("session", "recording").unwrap();
            let gain = session.add_property("gain").unwrap();
            gain.set_values(&[Value::Float64(2.5)]).unwrap();
            let block = file.create_block("trial-1", "ephys").unwrap();
            let _ = block.id().unwrap();
            file.close().unwrap();
        }

        let (code, out, err) = run_captured(&[path.to_str().unwrap()]);
        assert_eq!(code, 0, "stderr: {err}");
        assert!(out.contains("name: session"));
        assert!(out.contains("name: trial-1"));

        let (code, out, _err) = run_captured(&["--metadata", path.to_str().unwrap()]);
        assert_eq!(code, 0);
        assert!(out.contains("name: session"));
        assert!(!out.contains("name: trial-1"));
    }
}
