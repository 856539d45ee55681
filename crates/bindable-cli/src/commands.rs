use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::Value;

use bindable_bus::PubSub;
use bindable_model::{Model, ModelConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ModelConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ModelConfig::default(),
    };
    match cli.command {
        Command::Get(args) => cmd_get(args, config),
        Command::Set(args) => cmd_set(args, config),
        Command::Related(args) => cmd_related(args, config),
    }
}

fn load_model(path: &Path, config: ModelConfig) -> anyhow::Result<Model> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let model = Model::with_transport(value, Rc::new(PubSub::new()), config)?;
    Ok(model)
}

fn cmd_get(args: GetArgs, config: ModelConfig) -> anyhow::Result<()> {
    let model = load_model(&args.file, config)?;
    match model.to_object(args.chain.as_deref())? {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => bail!(
            "chain {} does not resolve",
            args.chain.unwrap_or_default().yellow()
        ),
    }
    Ok(())
}

/// Write `value` at `chain` and return the events each watched chain saw,
/// in delivery order.
fn apply_set(
    model: &Model,
    chain: &str,
    value: Value,
    watch: &[String],
) -> anyhow::Result<Vec<(String, String)>> {
    let fired = Rc::new(RefCell::new(Vec::new()));
    for watched in watch {
        let sink = Rc::clone(&fired);
        let watched_chain = watched.clone();
        model.on_change(watched, move |event| {
            sink.borrow_mut()
                .push((watched_chain.clone(), event.chain.clone()))
        })?;
    }
    if !model.set_chain_value(chain, value) {
        bail!("cannot write chain {chain:?}");
    }
    let fired = fired.borrow().clone();
    Ok(fired)
}

fn cmd_set(args: SetArgs, config: ModelConfig) -> anyhow::Result<()> {
    let model = load_model(&args.file, config)?;
    let value: Value = serde_json::from_str(&args.value)
        .with_context(|| format!("parsing value {:?}", args.value))?;

    let fired = apply_set(&model, &args.chain, value, &args.watch)?;
    println!("{} Set {}", "✓".green().bold(), args.chain.yellow());
    if fired.is_empty() && !args.watch.is_empty() {
        println!("  {}", "no watched chain fired".dimmed());
    }
    for (watched, chain) in &fired {
        println!("  {} {}", "fired".cyan(), watched.bold());
        if watched != chain {
            println!("    as {}", chain.dimmed());
        }
    }

    let document = serde_json::to_string_pretty(&model.to_object(None)?)?;
    if args.in_place {
        fs::write(&args.file, format!("{document}\n"))
            .with_context(|| format!("writing {}", args.file.display()))?;
        println!("Wrote {}", args.file.display().to_string().bold());
    } else {
        println!("{document}");
    }
    Ok(())
}

fn cmd_related(args: RelatedArgs, config: ModelConfig) -> anyhow::Result<()> {
    let model = Model::with_transport(Value::Object(Default::default()), Rc::new(PubSub::new()), config)?;
    for observed in &args.observe {
        model.on_change(observed, |_| {})?;
    }
    println!("Change of {} publishes on:", args.chain.yellow().bold());
    for chain in model.related_chains(&args.chain) {
        println!("  {}", model.namespace().channel_for(&chain));
    }
    Ok(())
}
