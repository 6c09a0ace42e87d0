//! Console front end for the kart inspection checklist.
//!
//! Reads one JSON action per stdin line and prints every resulting effect
//! as a JSON line on stdout. Remote dispatch and the post-submission reset
//! run alongside further input, so a second `submit` during a running
//! submission is ignored.
//!
//! Actions:
//!   {"type":"select","kart":3}
//!   {"type":"save","issues":["brakes","tires"],"note":"squeal"}
//!   {"type":"clear"}
//!   {"type":"remove","kart":3}
//!   {"type":"note","text":"pit lane light out"}
//!   {"type":"submit"}
//!   {"type":"clear_all"}
//!   {"type":"language"}
//!   {"type":"dashboard","search":"brakes","date":""}
//!   {"type":"dates"}
//!   {"type":"export","path":"out.csv"}

use std::collections::BTreeSet;
use std::pin::Pin;

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};

use kartcheck::config::Config;
use kartcheck::controller::Controller;
use kartcheck::dashboard::export_filename;
use kartcheck::effects::Effect;
use kartcheck::error::InspectionError;
use kartcheck::kart::IssueTag;
use kartcheck::logging::{log, obj, Domain, Level};
use kartcheck::sync::SyncOutcome;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputAction {
    Select {
        kart: u32,
    },
    Save {
        #[serde(default)]
        issues: Vec<String>,
        #[serde(default)]
        note: String,
    },
    Clear,
    Remove {
        kart: u32,
    },
    Note {
        text: String,
    },
    Submit,
    ClearAll,
    Language,
    Dashboard {
        #[serde(default)]
        search: String,
        #[serde(default)]
        date: String,
    },
    Dates,
    Export {
        path: Option<String>,
    },
}

fn emit(effects: &[Effect]) {
    for effect in effects {
        match serde_json::to_string(effect) {
            Ok(line) => println!("{}", line),
            Err(err) => eprintln!("unprintable effect {:?}: {}", effect, err),
        }
    }
}

fn emit_result(ctl: &Controller, result: Result<Vec<Effect>, InspectionError>) {
    match result {
        Ok(effects) => emit(&effects),
        Err(err) => emit(&[ctl.notice_for(&err)]),
    }
}

fn parse_issues(raw: &[String]) -> BTreeSet<IssueTag> {
    raw.iter()
        .filter_map(|s| {
            let tag = IssueTag::parse(s);
            if tag.is_none() {
                eprintln!("ignoring unknown issue tag {:?}", s);
            }
            tag
        })
        .collect()
}

async fn wait_dispatch(handle: &mut Option<JoinHandle<SyncOutcome>>) -> SyncOutcome {
    match handle {
        Some(h) => h
            .await
            .unwrap_or_else(|err| SyncOutcome::Failed(format!("dispatch task: {}", err))),
        None => std::future::pending().await,
    }
}

async fn wait_reset(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(t) => t.as_mut().await,
        None => std::future::pending().await,
    }
}

fn handle_action(ctl: &mut Controller, action: InputAction, dispatch: &mut Option<JoinHandle<SyncOutcome>>) {
    match action {
        InputAction::Select { kart } => {
            let r = ctl.select_for_edit(kart);
            emit_result(ctl, r);
        }
        InputAction::Save { issues, note } => {
            let r = ctl.save_current_edit(parse_issues(&issues), Some(note));
            emit_result(ctl, r);
        }
        InputAction::Clear => {
            let r = ctl.clear_current_edit();
            emit_result(ctl, r);
        }
        InputAction::Remove { kart } => {
            let r = ctl.remove_kart(kart);
            emit_result(ctl, r);
        }
        InputAction::Note { text } => ctl.set_general_note(&text),
        InputAction::Submit => match ctl.begin_submit() {
            Ok(Some(d)) => {
                emit(&d.effects);
                *dispatch = Some(tokio::spawn(async move {
                    let (outcome, notices) = d.push().await;
                    emit(&notices);
                    d.grace(&outcome).await;
                    outcome
                }));
            }
            Ok(None) => {}
            Err(err) => emit(&[ctl.notice_for(&err)]),
        },
        InputAction::ClearAll => emit(&ctl.clear_all()),
        InputAction::Language => emit(&ctl.toggle_language()),
        InputAction::Dashboard { search, date } => {
            let dash = ctl.dashboard();
            let hits = dash.filter(&search, &date, ctl.language());
            let rows = dash.rows(&hits, ctl.language());
            println!("{}", json!({ "dashboard": rows }));
        }
        InputAction::Dates => {
            println!("{}", json!({ "dates": ctl.dashboard().distinct_dates() }));
        }
        InputAction::Export { path } => {
            let path = path.unwrap_or_else(|| export_filename(&ctl.current_date()));
            emit(&ctl.export_archive(&path));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let mut ctl = Controller::from_config(cfg)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut dispatch: Option<JoinHandle<SyncOutcome>> = None;
    let mut reset_timer: Option<Pin<Box<Sleep>>> = None;
    let mut input_open = true;

    loop {
        if !input_open && dispatch.is_none() && reset_timer.is_none() {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<InputAction>(&line) {
                    Ok(action) => handle_action(&mut ctl, action, &mut dispatch),
                    Err(err) => eprintln!("bad action json: {}", err),
                }
            }
            _ = wait_dispatch(&mut dispatch) => {
                dispatch = None;
                emit(&ctl.finish_submit());
                reset_timer = Some(Box::pin(sleep(ctl.reset_delay())));
            }
            _ = wait_reset(&mut reset_timer) => {
                reset_timer = None;
                emit(&ctl.complete_cycle());
            }
        }
    }

    log(Level::Info, Domain::System, "session_end", obj(&[("archived", json!(ctl.archive().len()))]));
    Ok(())
}
