// generate and render lesson plans from the terminal
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use clap::{Arg, ArgMatches, Command};
use dotenv::dotenv;
use serde_json::{Map, Value};

use rpp_generator::config::Config;
use rpp_generator::coordinator::{Coordinator, CoordinatorState};
use rpp_generator::form::{FieldKind, FormInput, FIELD_GROUPS};
use rpp_generator::generation::{build_prompt, response_schema};
use rpp_generator::logger::init_logging;
use rpp_generator::render::{docx::build_docx, html::render_standalone, LessonDocument};
use rpp_generator::{GeminiClient, RPPRequest, RPPResponse};

fn request_arg() -> Arg {
    Arg::new("request")
        .long("request")
        .short('r')
        .value_name("FILE")
        .help("Request JSON (camelCase form fields)")
}

fn out_arg() -> Arg {
    Arg::new("out")
        .long("out")
        .short('o')
        .value_name("DIR")
        .default_value(".")
        .help("Directory for the .docx and .html files")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let matches = Command::new("rpp")
        .about("RPP Deep Learning and LKPD generator")
        .subcommand(
            Command::new("generate")
                .aliases(["gen", "g"])
                .about("Generate a lesson plan and worksheet")
                .arg(request_arg())
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("render")
                .aliases(["r"])
                .about("Render a saved response without calling the model")
                .arg(request_arg().required(true))
                .arg(
                    Arg::new("response")
                        .long("response")
                        .value_name("FILE")
                        .required(true)
                        .help("Response JSON saved by `generate`"),
                )
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("schema")
                .about("Print the structured-output schema")
                .arg(
                    Arg::new("method")
                        .long("method")
                        .short('m')
                        .default_value(rpp_generator::form::DEFAULT_LEARNING_METHOD),
                ),
        )
        .subcommand(
            Command::new("prompt")
                .about("Print the prompt sent for a request")
                .arg(request_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("generate", args)) => generate(args).await?,
        Some(("render", args)) => render(args)?,
        Some(("schema", args)) => {
            let method = args
                .get_one::<String>("method")
                .map(String::as_str)
                .unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&response_schema(method))?);
        }
        Some(("prompt", args)) => println!("{}", build_prompt(&load_request(args)?)),
        _ => {
            eprintln!("Invalid command, use rpp help");
        }
    }
    Ok(())
}

async fn generate(args: &ArgMatches) -> anyhow::Result<()> {
    let request = load_request(args)?;
    let client = GeminiClient::new(&Config::from_env());
    println!("Menyusun RPP Holistik ({})...", client.model());

    let mut coordinator = Coordinator::new();
    coordinator.submit(&client, request).await?;

    match coordinator.state() {
        CoordinatorState::Result { request, response } => {
            let out = out_dir(args)?;
            let json_path = out.join(format!("RPP-DeepLearning-{}.json", request.subject.trim()));
            fs::write(&json_path, serde_json::to_string_pretty(response)?)
                .with_context(|| format!("writing {}", json_path.display()))?;
            println!("Saved response to {}", json_path.display());
            write_outputs(request, response, &out)
        }
        CoordinatorState::Form { error, .. } => {
            bail!("{}", error.as_deref().unwrap_or("generation failed"))
        }
        CoordinatorState::Loading { .. } => bail!("generation did not complete"),
    }
}

fn render(args: &ArgMatches) -> anyhow::Result<()> {
    let request = load_request(args)?;
    let path = args
        .get_one::<String>("response")
        .context("--response is required")?;
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let response = RPPResponse::from_json(&text).with_context(|| format!("decoding {path}"))?;
    response.validate()?;
    write_outputs(&request, &response, &out_dir(args)?)
}

fn write_outputs(request: &RPPRequest, response: &RPPResponse, out: &Path) -> anyhow::Result<()> {
    let document = LessonDocument::build(request, response);

    let docx_path = out.join(document.file_name.replace(['/', '\\'], "-"));
    fs::write(&docx_path, build_docx(&document)?)
        .with_context(|| format!("writing {}", docx_path.display()))?;
    println!("Saved {}", docx_path.display());

    let html_path = docx_path.with_extension("html");
    fs::write(&html_path, render_standalone(&document)?)
        .with_context(|| format!("writing {}", html_path.display()))?;
    println!("Saved {}", html_path.display());
    Ok(())
}

fn out_dir(args: &ArgMatches) -> anyhow::Result<PathBuf> {
    let dir = PathBuf::from(args.get_one::<String>("out").map(String::as_str).unwrap_or("."));
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

/// From `--request`, otherwise asked field by field.
fn load_request(args: &ArgMatches) -> anyhow::Result<RPPRequest> {
    let input: FormInput = match args.get_one::<String>("request") {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("decoding {path}"))?
        }
        None => ask_fields()?,
    };
    Ok(input.into_request()?)
}

fn ask_fields() -> anyhow::Result<FormInput> {
    let mut values = Map::new();
    for group in FIELD_GROUPS.iter() {
        println!("\n{}", group.legend);
        for field in group.fields {
            let mut question = field.label.to_string();
            if field.kind == FieldKind::Select {
                for (idx, (value, _)) in field.options.iter().enumerate() {
                    println!("  ({}) {}", idx + 1, value);
                }
                question.push_str(" (nomor atau isian)");
            }
            if let Some(default) = field.default {
                question.push_str(&format!(" [{default}]"));
            }

            let mut answer = String::new();
            get_response(&question, &mut answer)?;
            let mut answer = answer.trim().to_string();

            // pick by number
            if let Ok(n) = answer.parse::<usize>() {
                if let Some((value, _)) = n.checked_sub(1).and_then(|i| field.options.get(i)) {
                    answer = value.to_string();
                }
            }
            values.insert(field.name.to_string(), Value::String(answer));
        }
    }
    Ok(serde_json::from_value(Value::Object(values))?)
}

fn get_response(question: &str, response: &mut String) -> io::Result<()> {
    print!("{}: ", question);
    io::stdout().flush()?;
    io::stdin().read_line(response)?;
    Ok(())
}
