// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use std::path::Path;
use std::sync::Arc;

use actix::Actor;
use anyhow::{Context, anyhow};
use clap::{Command, arg};
use electrolux_status::api::FixtureApi;
use electrolux_status::configuration::{DEF_CONFIG_FILE, get_configuration};
use electrolux_status::entity::identity::NoRegistry;
use electrolux_status::{
    APP_VERSION, Coordinator, ReadEntity, Setup, Shutdown, built_info,
};
use log::info;

#[actix::main]
async fn main() -> anyhow::Result<()> {
    let args = Command::new(built_info::PKG_NAME)
        .author("Unfolded Circle Aps")
        .version(APP_VERSION)
        .about("Electrolux appliance entity mapping")
        .arg(arg!(-c --config <FILE> "Configuration file").required(false))
        .arg(arg!(-f --fixtures <DIR> "Appliance fixture directory").required(true))
        .arg(arg!(--json "Print the entity descriptors as JSON"))
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.get_one::<String>("config") {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {}", DEF_CONFIG_FILE);
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c.as_str()),
    };
    let cfg = get_configuration(cfg_file).context("Failed to read configuration")?;

    let fixtures = args
        .get_one::<String>("fixtures")
        .ok_or_else(|| anyhow!("Missing fixture directory"))?;
    let api = Arc::new(FixtureApi::from_dir(fixtures)?);

    let coordinator = Coordinator::new(&cfg, api, Arc::new(NoRegistry)).start();
    let entities = coordinator.send(Setup).await??;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&entities)?);
    } else {
        for entity in entities.iter() {
            let value = coordinator
                .send(ReadEntity {
                    unique_id: entity.unique_id.clone(),
                })
                .await?;
            let value = match value {
                Some(value) => serde_json::to_string(&value)?,
                None => "-".into(),
            };
            println!(
                "{:<14}{:<50}{}: {value}{}",
                entity.kind.as_ref(),
                entity.unique_id,
                entity.name,
                entity
                    .unit
                    .as_deref()
                    .map(|u| format!(" {u}"))
                    .unwrap_or_default()
            );
        }
    }

    coordinator.send(Shutdown).await?;
    Ok(())
}
