mod args;
mod commands;
mod logger;

use bob_runtime::Interpreter;

use crate::args::{Action, parse_args};
use crate::commands::Flow;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() {
    logger::init();
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(v) => v,
        Err(usage) => {
            eprintln!("{usage}");
            std::process::exit(2);
        }
    };

    let mut interp = match Interpreter::new() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut flow = Flow::Continue;
    for action in &args.actions {
        flow = match action {
            Action::LineNumbers => {
                interp.config_mut().emit_line_numbers = true;
                Flow::Continue
            }
            Action::Compile { input, output } => {
                commands::compile(&mut interp, input, output.as_deref())
            }
            Action::Load { path, verbose } => commands::load(&mut interp, path, *verbose),
        };
        if flow != Flow::Continue {
            break;
        }
    }

    if flow != Flow::Exit && args.interactive {
        flow = commands::repl(&mut interp, std::io::stdin().lock());
    }

    log::debug!("exiting after {} collections", interp.heap().collections());
    if flow == Flow::Failed {
        std::process::exit(1);
    }
}
