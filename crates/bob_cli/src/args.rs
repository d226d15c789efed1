/// One command-line step, run in the order given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Compile {
        input: String,
        output: Option<String>,
    },
    Load {
        path: String,
        verbose: bool,
    },
    LineNumbers,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub actions: Vec<Action>,
    pub interactive: bool,
}

pub(crate) fn usage() -> &'static str {
    "\
usage: bob [-c file]     compile a source file
           [-g]          include debugging information
           [-i]          enter interactive mode after loading
           [-o file]     object file name for compile
           [-v]          enable verbose mode
           [-?]          display (this) help information
           [file]        load a source or object file"
}

/// Value of a flag given either attached (`-cfile`) or as the next word.
fn flag_value(attached: &str, rest: &mut impl Iterator<Item = String>) -> Result<String, String> {
    if !attached.is_empty() {
        return Ok(attached.to_string());
    }
    rest.next().ok_or_else(|| usage().to_string())
}

pub(crate) fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut argv = argv.into_iter();
    let mut actions = Vec::new();
    let mut output: Option<String> = None;
    let mut verbose = false;
    let mut wants_repl = false;
    let mut batch = false;

    while let Some(a) = argv.next() {
        if !a.starts_with('-') {
            actions.push(Action::Load {
                path: a,
                verbose: std::mem::take(&mut verbose),
            });
            batch = true;
            continue;
        }
        let flag = &a[1..];
        let attached = flag.get(1..).unwrap_or("");
        match flag.chars().next() {
            Some('c') => {
                let input = flag_value(attached, &mut argv)?;
                actions.push(Action::Compile {
                    input,
                    output: output.take(),
                });
                batch = true;
            }
            Some('o') => {
                output = Some(flag_value(attached, &mut argv)?);
                batch = true;
            }
            Some('g') => actions.push(Action::LineNumbers),
            Some('i') => wants_repl = true,
            Some('v') => verbose = true,
            _ => return Err(usage().to_string()),
        }
    }

    Ok(CliArgs {
        actions,
        interactive: wants_repl || !batch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_means_interactive() {
        assert_eq!(
            parse(&[]),
            Ok(CliArgs {
                actions: vec![],
                interactive: true
            })
        );
    }

    #[test]
    fn verbose_applies_to_the_next_file_only() {
        let args = parse(&["-v", "a.bob", "b.bbo"]).unwrap();
        assert_eq!(
            args.actions,
            vec![
                Action::Load {
                    path: "a.bob".into(),
                    verbose: true
                },
                Action::Load {
                    path: "b.bbo".into(),
                    verbose: false
                },
            ]
        );
        assert!(!args.interactive);
    }

    #[test]
    fn output_name_is_consumed_by_the_next_compile() {
        let args = parse(&["-g", "-o", "out", "-cprog", "-c", "other"]).unwrap();
        assert_eq!(
            args.actions,
            vec![
                Action::LineNumbers,
                Action::Compile {
                    input: "prog".into(),
                    output: Some("out".into())
                },
                Action::Compile {
                    input: "other".into(),
                    output: None
                },
            ]
        );
    }

    #[test]
    fn interactive_flag_survives_loads() {
        assert!(parse(&["-i", "lib.bob"]).unwrap().interactive);
    }

    #[test]
    fn bad_flags_show_usage() {
        assert!(parse(&["-?"]).unwrap_err().starts_with("usage: bob"));
        assert!(parse(&["-h"]).is_err());
        assert!(parse(&["-x"]).is_err());
        assert!(parse(&["-c"]).is_err());
    }
}
