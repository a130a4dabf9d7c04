use anyhow::Result;
use chrono::Datelike;
use convert_case::{Case, Casing};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use super::Context;
use crate::config::{self, is_valid_name, write_pretty_json, ProjectConfig};
use crate::constants::SCHEMA_FILE;
use crate::error::CliError;
use crate::license::{self, License};
use crate::report;

/// Version of a freshly scaffolded project
const INITIAL_VERSION: &str = "0.0.1";

#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub name: String,
    pub path: PathBuf,
    /// SPDX identifier of the generated LICENSE
    pub license: Option<&'static str>,
    pub typescript: bool,
}

pub fn run(ctx: &mut Context<'_>) -> Result<InitOutcome> {
    println!("Let's get started!\n");

    let name = loop {
        let answer = ctx.prompter.input(
            "What should your new Schema be called? Only alphanumeric, hyphen and underscore are allowed.",
            None,
        )?;
        let answer = answer.trim();
        if is_valid_name(answer) {
            break answer.to_string();
        }
        report::warn(format!("'{answer}' contains characters that are not allowed"));
    };

    let location = ctx.prompter.input(
        "Where do you want to create your new project?",
        Some(format!("./{name}")),
    )?;
    let path = ctx.resolve(Path::new(location.trim()));

    if path.exists() {
        ctx.confirm_or_abort("The directory you entered already exists. Do you want to overwrite it?")?;
    }
    fs::create_dir_all(&path)
        .map_err(|e| CliError::filesystem(format!("could not create {}", path.display()), e))?;

    let license = if ctx
        .prompter
        .confirm("Would you like to generate a license for your new schema?", true)?
    {
        let chosen = choose_license(ctx)?;
        let author = ctx
            .prompter
            .input("What author should your license refer to?", None)?;
        let text = chosen.render(author.trim(), chrono::Local::now().year());
        write_file(&path.join("LICENSE"), &text)?;
        Some(chosen.id)
    } else {
        None
    };

    write_file(
        &path.join("README.md"),
        &format!("# {name}\n\nThis is the readme for your new schema. Customize it how you see fit.\n"),
    )?;
    write_file(&path.join("CHANGELOG.md"), "")?;
    let scaffold = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "description": "Put your own schema description here...",
        "type": "object",
        "required": [],
        "properties": {},
    });
    write_pretty_json(&path.join(SCHEMA_FILE), &scaffold).map_err(CliError::from)?;
    config::save(&path, &ProjectConfig::new(&name, INITIAL_VERSION)).map_err(CliError::from)?;

    let typescript = ctx.prompter.confirm(
        "Do you want to author your schema in TypeScript? `openschema compile schema.ts` turns it into schema.json.",
        false,
    )?;
    if typescript {
        write_file(
            &path.join("schema.ts"),
            &format!("export interface {} {{}}\n", name.to_case(Case::Pascal)),
        )?;
    }

    println!("\nAmazing! We're all done here. Take a look at your new schema!");
    println!("\ncd {}", location.trim());

    Ok(InitOutcome {
        name,
        path,
        license,
        typescript,
    })
}

fn choose_license(ctx: &mut Context<'_>) -> Result<&'static License> {
    let term = ctx.prompter.input(
        "Let's choose a license for your new schema. Search for one (leave empty to list all):",
        Some(String::new()),
    )?;
    let mut hits = license::search(&term);
    if hits.is_empty() {
        report::warn(format!("no license matches '{}', showing all of them", term.trim()));
        hits = license::search("");
    }
    let items = hits.iter().map(|l| format!("{} ({})", l.name, l.id)).collect();
    let idx = ctx.prompter.select("Pick a license", items)?;
    Ok(hits[idx])
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .map_err(|e| CliError::filesystem(format!("could not write {}", path.display()), e))?;
    Ok(())
}
