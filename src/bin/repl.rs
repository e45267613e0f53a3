use dice_interp::{common::fmt_number, EvalContext, Registry};
use std::io::{self, BufRead, Write};

/// Reads one expression per line. `:macro name = expr` defines a macro and
/// `:input prompt = value` answers a roll query.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let registry = Registry::default();
    let mut ctx = EvalContext::new();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    print!("> ");
    io::stdout().flush()?;
    while let Some(Ok(line)) = lines.next() {
        let line = line.trim();
        if let Some((name, body)) = line.strip_prefix(":macro").and_then(|s| s.split_once('=')) {
            match ctx.define_macro(name.trim(), body.trim()) {
                Ok(()) => println!("defined #{}", name.trim()),
                Err(why) => eprintln!("Error: {}", why),
            }
        } else if let Some((prompt, value)) =
            line.strip_prefix(":input").and_then(|s| s.split_once('='))
        {
            ctx.set_input(prompt.trim(), value.trim());
        } else if !line.is_empty() {
            ctx.rolls.clear();
            ctx.warnings.clear();
            match registry.process_expression(line, &mut ctx) {
                Ok(result) => {
                    println!("{} {:?}", fmt_number(result.total), result.rolls);
                    for warning in &result.warnings {
                        println!("  warning: {}", warning);
                    }
                    println!("  {}", serde_json::to_string(&result.details)?);
                }
                Err(why) => eprintln!("Error: {}", why),
            }
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}
