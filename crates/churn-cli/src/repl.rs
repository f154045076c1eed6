//! Interactive session - the single page as a prompt

use std::io::{self, Write};

use anyhow::{bail, Result};
use churn_client::{
    BatchFile, ChurnApi, ChurnClient, ChurnSession, Completion, Dispatcher, FeatureKey, Form,
    Metric, ModelKind, Outcome, RequestHandle,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::print_flow;

/// What woke the prompt up
#[derive(Debug)]
enum Input {
    Line(String),
    Completed(Completion),
    Eof,
}

/// Next typed line, or the next request to land while the user is idle
async fn next_input<R, A>(
    lines: &mut Lines<R>,
    dispatcher: &mut Dispatcher<A>,
    session: &mut ChurnSession,
) -> Result<Input>
where
    R: AsyncBufRead + Unpin,
    A: ChurnApi + 'static,
{
    let busy = dispatcher.pending() > 0;
    tokio::select! {
        line = lines.next_line() => Ok(match line? {
            Some(line) => Input::Line(line),
            None => Input::Eof,
        }),
        Some(done) = dispatcher.next_event(session), if busy => Ok(Input::Completed(done)),
    }
}

pub async fn run_interactive(
    mut dispatcher: Dispatcher<ChurnClient>,
    mut session: ChurnSession,
) -> Result<()> {
    display_welcome(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        report(&dispatcher.poll(&mut session), &session);

        print!("{}", prompt(&session));
        stdout.flush()?;

        let line = match next_input(&mut lines, &mut dispatcher, &mut session).await? {
            Input::Line(line) => line,
            Input::Completed(done) => {
                println!();
                report(&[done], &session);
                continue;
            }
            Input::Eof => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();
        let args = &parts[1..];

        let outcome = match cmd.as_str() {
            "help" | "h" | "?" => {
                display_help();
                Ok(())
            }
            "mode" | "toggle" => {
                session.mode.toggle();
                println!("  Switched to {} mode", session.mode.label());
                Ok(())
            }
            "model" => set_model(&mut session, args),
            "metric" => set_metric(&mut session, args),
            "set" => set_feature(&mut session, args),
            "features" | "f" => {
                display_features(&session);
                Ok(())
            }
            "file" => set_file(&mut session, args),
            "evaluate" | "eval" | "e" => submit(&mut dispatcher, &mut session, Form::Evaluation),
            "predict" | "p" => submit(&mut dispatcher, &mut session, Form::SinglePrediction),
            "batch" | "b" => submit(&mut dispatcher, &mut session, Form::BatchPrediction),
            "wait" | "w" => {
                let done = dispatcher.wait_idle(&mut session).await;
                report(&done, &session);
                Ok(())
            }
            "show" | "s" => {
                show(&session);
                Ok(())
            }
            "status" => {
                display_status(&dispatcher, &session);
                Ok(())
            }
            "clear" | "cls" => {
                print!("\x1B[2J\x1B[1;1H");
                stdout.flush()?;
                Ok(())
            }
            "exit" | "quit" | "q" => break,
            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", cmd);
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("Error: {}", e);
        }
    }

    Ok(())
}

fn prompt(session: &ChurnSession) -> String {
    let marker = if session.is_loading() { " (loading)" } else { "" };
    format!("[{}]{} > ", session.mode.label(), marker)
}

fn submit<A: ChurnApi + 'static>(
    dispatcher: &mut Dispatcher<A>,
    session: &mut ChurnSession,
    form: Form,
) -> Result<()> {
    if !session.mode.shows(form) {
        bail!(
            "that form is hidden in {} mode; use `mode` to switch",
            session.mode.label()
        );
    }

    let handle: RequestHandle = match form {
        Form::Evaluation => dispatcher.submit_evaluation(session)?,
        Form::SinglePrediction => dispatcher.submit_single_prediction(session)?,
        Form::BatchPrediction => dispatcher.submit_batch_prediction(session)?,
    };
    println!("  Submitted {} #{}", handle.flow.label(), handle.id);
    Ok(())
}

fn set_model(session: &mut ChurnSession, args: &[&str]) -> Result<()> {
    let model = match args.join(" ").as_str() {
        "" | "none" => None,
        name => Some(name.parse::<ModelKind>()?),
    };
    session.form.set_model(model);
    Ok(())
}

fn set_metric(session: &mut ChurnSession, args: &[&str]) -> Result<()> {
    let metric = match args.join(" ").as_str() {
        "" | "none" => None,
        name => Some(name.parse::<Metric>()?),
    };
    session.form.set_metric(metric);
    Ok(())
}

/// `set <feature name> <value>`; the last word is the value, `""` clears it
fn set_feature(session: &mut ChurnSession, args: &[&str]) -> Result<()> {
    let (key, value) = split_feature_args(args)?;
    session.form.set_feature_field(key, value);
    Ok(())
}

fn split_feature_args(args: &[&str]) -> Result<(FeatureKey, String)> {
    let Some((value, name)) = args.split_last() else {
        bail!("Usage: set <feature name> <value>");
    };
    if name.is_empty() {
        bail!("Usage: set <feature name> <value>");
    }
    let key = name.join(" ").parse::<FeatureKey>()?;
    let value = if *value == "\"\"" { "" } else { value };
    Ok((key, value.to_string()))
}

fn set_file(session: &mut ChurnSession, args: &[&str]) -> Result<()> {
    let path = args.join(" ");
    let file = match path.as_str() {
        "" | "none" => None,
        p => Some(BatchFile::open(p)?),
    };
    if let Some(f) = &file {
        println!("  Selected {} ({} rows)", f.file_name, f.row_count());
    }
    session.form.set_file(file);
    Ok(())
}

fn report(done: &[Completion], session: &ChurnSession) {
    for completion in done {
        match &completion.outcome {
            Outcome::Stored => print_flow(session, completion.flow, false),
            // failures are already logged by the dispatcher
            Outcome::Failed(_) | Outcome::Cancelled => {}
        }
    }
}

fn show(session: &ChurnSession) {
    let Some(flow) = session.results.last else {
        println!("  No results yet");
        return;
    };
    print_flow(session, flow, session.mode.is_developer());
}

fn display_features(session: &ChurnSession) {
    println!();
    println!("{:-<50}", "");
    for (key, value) in session.form.features.iter() {
        let shown = if value.is_empty() { "-" } else { value };
        println!("  {:<28} {}", key.label(), shown);
    }
    println!("{:-<50}", "");
    println!();
}

fn display_status<A: ChurnApi + 'static>(dispatcher: &Dispatcher<A>, session: &ChurnSession) {
    let form = &session.form;
    println!();
    println!("Session:");
    println!("{:-<40}", "");
    println!("  Mode:      {}", session.mode.label());
    println!(
        "  Model:     {}",
        form.model.map(|m| m.label()).unwrap_or("-")
    );
    println!(
        "  Metric:    {}",
        form.metric.map(|m| m.label()).unwrap_or("-")
    );
    println!(
        "  File:      {}",
        form.file.as_ref().map(|f| f.file_name.as_str()).unwrap_or("-")
    );
    println!("  In flight: {}", dispatcher.pending());
    println!();
}

fn display_welcome(session: &ChurnSession) {
    println!();
    println!("  Customer Churn Prediction System");
    println!();
    println!("  Starting in {} mode. Type `help` for commands.", session.mode.label());
    println!();
}

fn display_help() {
    println!();
    println!("Available Commands:");
    println!("  mode, toggle           Switch between simple and developer mode");
    println!("  status                 Show selections and requests in flight");
    println!("  show, s                Show the latest result");
    println!("  wait, w                Wait for all requests to finish");
    println!();
    println!("  Simple mode:");
    println!("    model <name|none>    Logistic Regression, Random Forest, XGBoost");
    println!("    metric <name|none>   Accuracy, Precision, Recall");
    println!("    evaluate, e          Submit the evaluation");
    println!();
    println!("  Developer mode:");
    println!("    set <feature> <val>  e.g. `set customer service calls 5`");
    println!("    features, f          Show the feature form");
    println!("    predict, p           Submit a single prediction");
    println!("    file <path|none>     Select a CSV for bulk prediction");
    println!("    batch, b             Submit the bulk prediction");
    println!();
    println!("  clear, cls             Clear screen");
    println!("  exit, quit, q          Leave");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_feature_args() {
        let (key, value) = split_feature_args(&["total", "day", "minutes", "265.1"]).unwrap();
        assert_eq!(key, FeatureKey::TotalDayMinutes);
        assert_eq!(value, "265.1");

        let (key, value) = split_feature_args(&["international", "plan_yes", "\"\""]).unwrap();
        assert_eq!(key, FeatureKey::InternationalPlanYes);
        assert_eq!(value, "");

        assert!(split_feature_args(&["5"]).is_err());
        assert!(split_feature_args(&[]).is_err());
        assert!(split_feature_args(&["zip", "code", "1"]).is_err());
    }

    #[test]
    fn test_model_and_metric_can_be_cleared() {
        let mut session = ChurnSession::new();
        set_model(&mut session, &["Random", "Forest"]).unwrap();
        set_metric(&mut session, &["recall"]).unwrap();
        assert_eq!(session.form.model, Some(ModelKind::RandomForest));
        assert_eq!(session.form.metric, Some(Metric::Recall));

        set_model(&mut session, &["none"]).unwrap();
        assert_eq!(session.form.model, None);
        assert!(set_metric(&mut session, &["F1"]).is_err());
    }

    #[tokio::test]
    async fn test_hidden_form_is_not_submitted() {
        let client = ChurnClient::new("http://127.0.0.1:9");
        let mut dispatcher = Dispatcher::new(std::sync::Arc::new(client));
        let mut session = ChurnSession::new();

        assert!(submit(&mut dispatcher, &mut session, Form::SinglePrediction).is_err());
        assert_eq!(dispatcher.pending(), 0);
    }

    #[tokio::test]
    async fn test_completion_wakes_idle_prompt() {
        let client = ChurnClient::new("http://127.0.0.1:9");
        let mut dispatcher = Dispatcher::new(std::sync::Arc::new(client));
        let mut session = ChurnSession::new();
        session.mode.toggle();

        // the writer stays open and silent, like a user who has not pressed Enter
        let (_keyboard, terminal) = tokio::io::duplex(64);
        let mut lines = BufReader::new(terminal).lines();

        submit(&mut dispatcher, &mut session, Form::SinglePrediction).unwrap();
        assert_eq!(prompt(&session), "[developer] (loading) > ");

        let input = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            next_input(&mut lines, &mut dispatcher, &mut session),
        )
        .await
        .expect("completion arrived without input")
        .unwrap();

        assert!(matches!(input, Input::Completed(_)));
        assert!(!session.is_loading());
        assert_eq!(prompt(&session), "[developer] > ");
    }

    #[tokio::test]
    async fn test_typed_line_and_eof() {
        let client = ChurnClient::new("http://127.0.0.1:9");
        let mut dispatcher = Dispatcher::new(std::sync::Arc::new(client));
        let mut session = ChurnSession::new();
        let mut lines = BufReader::new(&b"status\n"[..]).lines();

        let input = next_input(&mut lines, &mut dispatcher, &mut session).await.unwrap();
        assert!(matches!(input, Input::Line(ref l) if l == "status"));
        let input = next_input(&mut lines, &mut dispatcher, &mut session).await.unwrap();
        assert!(matches!(input, Input::Eof));
    }
}
