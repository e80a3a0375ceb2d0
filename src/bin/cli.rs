use chrono::NaiveDate;
use pert_network::{
    Activity, FinishRule, Project, ProjectError, RiskError, load_project_from_csv,
    load_project_from_json, parse_predecessor_list, save_project_to_csv, save_project_to_json,
};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn format_cell(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) if v.is_infinite() => "inf".to_string(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Boolean(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| format_cell(&av)).unwrap_or_default())
            .collect();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (i, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[i].saturating_sub(value.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn activity_listing(project: &Project) -> Result<DataFrame, ProjectError> {
    let activities = project.activities();
    let names: Vec<String> = activities.iter().map(|a| a.name.clone()).collect();
    let preds: Vec<String> = activities
        .iter()
        .map(|a| {
            if a.predecessors.is_empty() {
                "null".to_string()
            } else {
                a.predecessors.join(",")
            }
        })
        .collect();
    let o: Vec<f64> = activities.iter().map(|a| a.optimistic).collect();
    let m: Vec<f64> = activities.iter().map(|a| a.most_likely).collect();
    let p: Vec<f64> = activities.iter().map(|a| a.pessimistic).collect();
    let te: Vec<f64> = activities.iter().map(Activity::expected_time).collect();
    let df = DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("activity"), names).into_column(),
        Series::new(PlSmallStr::from_static("predecessors"), preds).into_column(),
        Series::new(PlSmallStr::from_static("optimistic"), o).into_column(),
        Series::new(PlSmallStr::from_static("most_likely"), m).into_column(),
        Series::new(PlSmallStr::from_static("pessimistic"), p).into_column(),
        Series::new(PlSmallStr::from_static("expected_time"), te).into_column(),
    ])?;
    Ok(df)
}

fn print_activities(project: &Project) {
    if project.activities().is_empty() {
        println!("No activities defined.");
        return;
    }
    match activity_listing(project) {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error rendering activities: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               List activities\n  add <NAME> <preds|null> <o> <m> <p>\n                                     Upsert an activity (preds like A,B)\n  delete <NAME>                      Delete an activity and clean up dependencies\n  target <value|none>                Set the default target duration\n  rule <sink|positional>             Choose how activities converge on finish\n  network                            Show the activity-on-edge network\n  analyze [target]                   Critical path, sigma and completion probability\n  meta show                          Show project metadata\n  meta name <text...>                Update project name\n  meta desc <text...>                Update project description\n  meta start <YYYY-MM-DD>            Update project start date\n  save <json|csv> <path>             Persist project to disk\n  load <json|csv> <path>             Load project from disk\n  quit|exit                          Exit"
    );
}

fn print_metadata(project: &Project) {
    let metadata = project.metadata();
    println!("Project name       : {}", metadata.project_name);
    println!("Project description: {}", metadata.project_description);
    println!("Project start date : {}", metadata.project_start_date);
    match metadata.target_duration {
        Some(target) => println!("Target duration    : {}", target),
        None => println!("Target duration    : (none)"),
    }
    println!("Finish rule        : {}", metadata.finish_rule.as_str());
}

fn print_network(project: &Project) {
    match project.build_network() {
        Ok(network) => {
            println!(
                "Events: {} (start {}, finish {})",
                network.node_count(),
                network.start_event(),
                network
                    .finish_event()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "?".to_string())
            );
            for (from, to, _, edge) in network.edges() {
                let label = if edge.is_merge() { "(merge)" } else { edge.label.as_str() };
                println!("  {from} -> {to}  {label}");
            }
        }
        Err(e) => println!("Network error: {}", e),
    }
}

fn analyze(project: &Project, target: Option<f64>) {
    match project.analyze(target) {
        Ok(report) => {
            println!("Analysis ({})", report.to_cli_summary());
            if let Some(Err(RiskError::ZeroVariance)) = &report.risk {
                println!("Critical path has zero variance; probability is undefined.");
            }
            match report.activity_frame() {
                Ok(df) => println!("{}", render_df_as_text_table(&df)),
                Err(e) => println!("Error rendering report: {}", e),
            }
        }
        Err(e) => println!("Analysis error: {}", e),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let mut project = Project::new();

    println!("PERT Network Tool (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print_activities(&project),
            "add" => {
                let fields: Vec<&str> = parts.collect();
                let [name, preds, o_s, m_s, p_s] = fields.as_slice() else {
                    println!("Usage: add <NAME> <preds|null> <o> <m> <p>");
                    continue;
                };
                let mut times = [0.0_f64; 3];
                let mut valid = true;
                for (slot, raw) in times.iter_mut().zip([o_s, m_s, p_s]) {
                    match raw.parse::<f64>() {
                        Ok(v) => *slot = v,
                        Err(_) => {
                            println!("Invalid time '{}'. Please enter valid times for all fields.", raw);
                            valid = false;
                            break;
                        }
                    }
                }
                if !valid {
                    continue;
                }
                let activity = Activity::new(name, times[0], times[1], times[2])
                    .with_predecessors(parse_predecessor_list(preds));
                match project.upsert_activity(activity) {
                    Ok(_) => {
                        println!("Activity upserted.");
                        print_activities(&project);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "delete" => match parts.next() {
                Some(name) => {
                    if project.delete_activity(name) {
                        println!("Deleted activity {}.", name.to_uppercase());
                        print_activities(&project);
                    } else {
                        println!("Activity {} not found.", name.to_uppercase());
                    }
                }
                None => println!("Usage: delete <NAME>"),
            },
            "target" => match parts.next() {
                Some("none") => match project.set_target_duration(None) {
                    Ok(_) => println!("Target duration cleared."),
                    Err(e) => println!("Error: {}", e),
                },
                Some(raw) => match raw.parse::<f64>() {
                    Ok(value) => match project.set_target_duration(Some(value)) {
                        Ok(_) => println!("Target duration set to {}.", value),
                        Err(e) => println!("Error: {}", e),
                    },
                    Err(_) => println!("Please enter a valid target duration."),
                },
                None => println!("Usage: target <value|none>"),
            },
            "rule" => match parts.next().map(str::parse::<FinishRule>) {
                Some(Ok(rule)) => {
                    project.set_finish_rule(rule);
                    println!("Finish rule set to {}.", rule.as_str());
                }
                Some(Err(e)) => println!("Error: {}", e),
                None => println!("Usage: rule <sink|positional>"),
            },
            "network" => print_network(&project),
            "analyze" => match parts.next() {
                Some(raw) => match raw.parse::<f64>() {
                    Ok(target) => analyze(&project, Some(target)),
                    Err(_) => println!("Please enter a valid target duration."),
                },
                None => analyze(&project, None),
            },
            "meta" => match parts.next() {
                Some("show") | None => print_metadata(&project),
                Some("name") => {
                    let rest: Vec<&str> = parts.collect();
                    if rest.is_empty() {
                        println!("Usage: meta name <text...>");
                        continue;
                    }
                    project.set_project_name(rest.join(" "));
                    println!("Project name updated.");
                    print_metadata(&project);
                }
                Some("desc") => {
                    let rest: Vec<&str> = parts.collect();
                    if rest.is_empty() {
                        println!("Usage: meta desc <text...>");
                        continue;
                    }
                    project.set_project_description(rest.join(" "));
                    println!("Project description updated.");
                    print_metadata(&project);
                }
                Some("start") => match parts.next() {
                    Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                        Ok(date) => {
                            project.set_project_start_date(date);
                            println!("Project start date updated.");
                            print_metadata(&project);
                        }
                        Err(_) => println!("Invalid start date (YYYY-MM-DD)"),
                    },
                    None => println!("Usage: meta start <YYYY-MM-DD>"),
                },
                Some(other) => {
                    println!("Unknown meta command '{}'.", other);
                    println!("Usage: meta show|name|desc|start ...");
                }
            },
            "save" => {
                let fmt = parts.next();
                let path = parts.next();
                let result = match (fmt, path) {
                    (Some("json"), Some(path)) => Some((path, save_project_to_json(&project, path))),
                    (Some("csv"), Some(path)) => Some((path, save_project_to_csv(&project, path))),
                    _ => None,
                };
                match result {
                    Some((path, Ok(()))) => println!("Project saved to {}.", path),
                    Some((_, Err(e))) => println!("Error saving project: {}", e),
                    None => println!("Usage: save <json|csv> <path>"),
                }
            }
            "load" => {
                let fmt = parts.next();
                let path = parts.next();
                let result = match (fmt, path) {
                    (Some("json"), Some(path)) => Some((path, load_project_from_json(path))),
                    (Some("csv"), Some(path)) => Some((path, load_project_from_csv(path))),
                    _ => None,
                };
                match result {
                    Some((path, Ok(loaded))) => {
                        project = loaded;
                        println!("Project loaded from {}.", path);
                        print_activities(&project);
                    }
                    Some((_, Err(e))) => println!("Error loading project: {}", e),
                    None => println!("Usage: load <json|csv> <path>"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
