use std::path::PathBuf;

use repo_reviewer::commands::{self, AppState};
use repo_reviewer::models::{
    Notification, NotificationVariant, ProjectDescriptionForm, ProjectUploadForm, RenderNode,
    SessionPhase,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  /new                                 start over with another repository
  /attach <path>...                    add files to the upload selection
  /files                               list the selection
  /drop <index>                        remove a file from the selection
  /upload <project> <description> <grade>
                                       upload the selection as a project
  /describe <id> | <name> | <text>     save a project description
  /quit                                exit
Anything else is sent to the reviewer as a question.";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut state = match repo_reviewer::load_config().and_then(AppState::from_config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    println!("Repository Reviewer. Enter a repository URL (e.g. https://github.com/username/repo).");
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            if !run_command(&mut state, line).await {
                break;
            }
            continue;
        }

        match commands::get_session(&state).phase {
            SessionPhase::Analyzed => {
                commands::set_chat_input(&mut state, line);
                if let Err(n) = commands::send_chat_input(&mut state).await {
                    show(&n);
                }
                print_last_reply(&state);
            }
            _ => {
                println!("Analyzing {} ...", line);
                match commands::analyze_repository(&mut state, line).await {
                    Ok(n) => {
                        show(&n);
                        print_last_reply(&state);
                    }
                    Err(n) => show(&n),
                }
            }
        }
    }
}

/// Returns false when the user asked to quit.
async fn run_command(state: &mut AppState, line: &str) -> bool {
    let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();

    match name {
        "/quit" => return false,
        "/new" => {
            commands::new_session(state);
            println!("Enter a repository URL.");
        }
        "/attach" => {
            let paths: Vec<PathBuf> = args.iter().map(PathBuf::from).collect();
            match commands::add_file_paths(state, &paths) {
                Ok(files) => println!("{} file(s) selected", files.len()),
                Err(n) => show(&n),
            }
        }
        "/files" => {
            for (index, file) in state.selected_files().iter().enumerate() {
                println!("  [{}] {} ({:.2} KB, {})", index, file.name, file.size as f64 / 1024.0, file.mime_type);
            }
        }
        "/drop" => match args.first().and_then(|a| a.parse::<usize>().ok()) {
            Some(index) => {
                let files = commands::remove_file(state, index);
                println!("{} file(s) selected", files.len());
            }
            None => println!("Usage: /drop <index>"),
        },
        "/upload" => {
            let form = ProjectUploadForm {
                project_id: args.first().unwrap_or(&"").to_string(),
                project_description_id: args.get(1).unwrap_or(&"").to_string(),
                grade: args.get(2).unwrap_or(&"").to_string(),
            };
            match commands::submit_project_upload(state, &form).await {
                Ok(n) | Err(n) => show(&n),
            }
        }
        "/describe" => {
            let mut parts = rest.splitn(3, '|').map(str::trim);
            let form = ProjectDescriptionForm {
                project_descriptions_id: parts.next().unwrap_or_default().to_string(),
                project_name: parts.next().unwrap_or_default().to_string(),
                project_descriptions: parts.next().unwrap_or_default().to_string(),
            };
            match commands::submit_project_description(state, &form).await {
                Ok(n) | Err(n) => show(&n),
            }
        }
        _ => println!("{}", HELP),
    }
    true
}

fn show(notification: &Notification) {
    match notification.variant {
        NotificationVariant::Default => println!("✔ {}: {}", notification.title, notification.description),
        NotificationVariant::Destructive => println!("✘ {}: {}", notification.title, notification.description),
    }
}

fn print_last_reply(state: &AppState) {
    let session = commands::get_session(state);
    if let Some(message) = session.messages.last() {
        let rendered = commands::render_message(state, &message.text);
        let mut out = String::new();
        for node in &rendered.nodes {
            write_terminal(node, &mut out);
        }
        println!("\n{}\n", out.trim_end());
    }
}

/// Flattens a rendered message for a 24-bit colour terminal.
fn write_terminal(node: &RenderNode, out: &mut String) {
    match node {
        RenderNode::Text { text } => out.push_str(text),
        RenderNode::InlineCode { code } => out.push_str(&format!("`{}`", code)),
        RenderNode::CodeBlock(block) => {
            out.push('\n');
            match &block.lines {
                Some(lines) => {
                    for span in lines.iter().flatten() {
                        let rgb = u32::from_str_radix(span.color.trim_start_matches('#'), 16).unwrap_or(0xffffff);
                        out.push_str(&format!(
                            "\x1b[38;2;{};{};{}m{}",
                            (rgb >> 16) & 0xff,
                            (rgb >> 8) & 0xff,
                            rgb & 0xff,
                            span.text
                        ));
                    }
                    out.push_str("\x1b[0m");
                }
                None => out.push_str(&block.code),
            }
            out.push('\n');
        }
        RenderNode::Element { tag, children, .. } => {
            if tag == "li" {
                out.push_str("  • ");
            }
            for child in children {
                write_terminal(child, out);
            }
            match tag.as_str() {
                "p" | "li" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" => out.push('\n'),
                "br" => out.push('\n'),
                "th" | "td" => out.push('\t'),
                _ => {}
            }
        }
    }
}
