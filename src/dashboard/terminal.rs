//! Line-oriented terminal front end.
//!
//! Lifecycle operations block on OS calls, so they run on the blocking
//! pool while this task draws a progress spinner. Status is refreshed on
//! a timer while waiting for input.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::error::{CommandErrorKind, InstallerError, InstallerResult};
use crate::services::{FamilyStatus, LogTarget, Status};

use super::controller::{Controller, OperationOutcome};
use super::menu::{available_actions, render_dashboard, render_family_menu, FamilyAction};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Screen {
    Dashboard,
    Family(String),
    Logs(String),
}

/// Run the dashboard until the operator quits, stdin closes or Ctrl-C.
pub async fn run(controller: Arc<Controller>, refresh_interval: Duration) -> InstallerResult<()> {
    let mut terminal = Terminal {
        controller,
        input: BufReader::new(tokio::io::stdin()).lines(),
        out: tokio::io::stdout(),
        screen: Screen::Dashboard,
        snapshot: Vec::new(),
    };
    terminal.run(refresh_interval).await
}

struct Terminal {
    controller: Arc<Controller>,
    input: Lines<BufReader<Stdin>>,
    out: Stdout,
    screen: Screen,
    snapshot: Vec<(String, FamilyStatus)>,
}

impl Terminal {
    async fn run(&mut self, refresh_interval: Duration) -> InstallerResult<()> {
        self.refresh().await?;
        self.render().await?;

        let mut ticker = interval(refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                line = self.input.next_line() => {
                    let Some(line) = line? else { break };
                    if !self.handle(line.trim()).await? {
                        break;
                    }
                    self.render().await?;
                }
                _ = ticker.tick() => {
                    let before = self.snapshot.clone();
                    self.refresh().await?;
                    if self.snapshot != before {
                        debug!("Status changed, redrawing");
                        self.render().await?;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        self.write("\nBye.\n").await
    }

    /// Apply one line of input. Returns `false` to quit.
    async fn handle(&mut self, input: &str) -> InstallerResult<bool> {
        match self.screen.clone() {
            Screen::Dashboard => {
                if input.eq_ignore_ascii_case("q") {
                    return Ok(false);
                }
                if let Some(i) = parse_choice(input, self.snapshot.len()) {
                    self.screen = Screen::Family(self.snapshot[i].0.clone());
                }
                Ok(true)
            }
            Screen::Family(family) => self.handle_family(&family, input).await,
            Screen::Logs(family) => {
                let target = match parse_choice(input, 3) {
                    Some(0) => LogTarget::File,
                    Some(1) => LogTarget::Directory,
                    Some(_) => {
                        self.screen = Screen::Family(family);
                        return Ok(true);
                    }
                    None if is_back(input) => {
                        self.screen = Screen::Family(family);
                        return Ok(true);
                    }
                    None => return Ok(true),
                };
                self.perform("Opening logs", move |c| c.open_logs(&family, target))
                    .await
            }
        }
    }

    async fn handle_family(&mut self, family: &str, input: &str) -> InstallerResult<bool> {
        let status = self.status_of(family);
        let actions = available_actions(&status);

        if is_back(input) {
            self.screen = Screen::Dashboard;
            return Ok(true);
        }
        // `r` restarts a running service from anywhere in the menu.
        let action = if input.eq_ignore_ascii_case("r") && status.active_status() == Status::Running {
            FamilyAction::Restart
        } else {
            match parse_choice(input, actions.len()) {
                Some(i) => actions[i],
                None => return Ok(true),
            }
        };

        let title = self.title_of(family);
        let family = family.to_string();
        match action {
            FamilyAction::Install(kind) => {
                if !self
                    .confirm(&format!("Install the {} version of {}?", kind, title))
                    .await?
                {
                    return Ok(true);
                }
                self.perform("Installing", move |c| c.install(&family, kind))
                    .await
            }
            FamilyAction::Uninstall => {
                let kind = status
                    .active_variant_kind()
                    .map(|k| k.to_string())
                    .unwrap_or_default();
                if !self
                    .confirm(&format!("Uninstall {} from {}?", kind, title))
                    .await?
                {
                    return Ok(true);
                }
                self.perform("Uninstalling", move |c| c.uninstall(&family))
                    .await
            }
            FamilyAction::Start => self.perform("Starting", move |c| c.start(&family)).await,
            FamilyAction::Stop => self.perform("Stopping", move |c| c.stop(&family)).await,
            FamilyAction::Restart => {
                self.perform("Restarting", move |c| c.restart(&family))
                    .await
            }
            FamilyAction::Logs => {
                self.screen = Screen::Logs(family);
                Ok(true)
            }
            FamilyAction::Back => {
                self.screen = Screen::Dashboard;
                Ok(true)
            }
        }
    }

    /// Run `op` on the blocking pool, spinning until it finishes.
    ///
    /// Ctrl-C does not cancel a running operation; the dashboard exits
    /// once it completes. Returns `false` in that case.
    async fn perform<F>(&mut self, title: &str, op: F) -> InstallerResult<bool>
    where
        F: FnOnce(&Controller) -> OperationOutcome + Send + 'static,
    {
        let controller = Arc::clone(&self.controller);
        let mut task = tokio::task::spawn_blocking(move || op(&controller));

        let mut spinner = interval(Duration::from_millis(120));
        let mut frame = 0usize;
        let mut quit = false;

        let outcome = loop {
            tokio::select! {
                joined = &mut task => {
                    break joined.unwrap_or_else(|e| {
                        OperationOutcome::failed(format!("[X] Operation aborted: {}", e))
                    });
                }
                _ = spinner.tick() => {
                    let line = format!("\r  {} {}...", SPINNER[frame % SPINNER.len()], title);
                    frame += 1;
                    self.write(&line).await?;
                }
                _ = tokio::signal::ctrl_c(), if !quit => {
                    quit = true;
                    self.write("\n  Exit requested, waiting for the operation to finish\n").await?;
                }
            }
        };

        self.write(&format!("\r  {}\n", outcome.message)).await?;
        self.refresh().await?;
        Ok(!quit)
    }

    async fn confirm(&mut self, question: &str) -> InstallerResult<bool> {
        self.write(&format!("  {} [y/N] ", question)).await?;
        let answer = self.input.next_line().await?.unwrap_or_default();
        Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "s" | "S"))
    }

    async fn refresh(&mut self) -> InstallerResult<()> {
        let controller = Arc::clone(&self.controller);
        self.snapshot = tokio::task::spawn_blocking(move || controller.refresh())
            .await
            .map_err(|e| InstallerError::Command {
                kind: CommandErrorKind::ExecutionFailed {
                    message: format!("status refresh aborted: {}", e),
                },
            })?;
        Ok(())
    }

    async fn render(&mut self) -> InstallerResult<()> {
        let text = match &self.screen {
            Screen::Dashboard => {
                let rows: Vec<(String, FamilyStatus)> = self
                    .snapshot
                    .iter()
                    .map(|(key, status)| (self.title_of(key), *status))
                    .collect();
                render_dashboard(&rows)
            }
            Screen::Family(family) => {
                let status = self.status_of(family);
                render_family_menu(&self.title_of(family), &status, &available_actions(&status))
            }
            Screen::Logs(family) => format!(
                "\n== {} logs ==\n  [1] Open log file\n  [2] Open log folder\n  [3] Back\n",
                self.title_of(family)
            ),
        };
        self.write(&format!("{}> ", text)).await
    }

    fn status_of(&self, family: &str) -> FamilyStatus {
        self.snapshot
            .iter()
            .find(|(key, _)| key == family)
            .map(|(_, status)| *status)
            .unwrap_or_default()
    }

    fn title_of(&self, family: &str) -> String {
        self.controller
            .registry()
            .family(family)
            .map(|f| f.title.clone())
            .unwrap_or_else(|| family.to_string())
    }

    async fn write(&mut self, text: &str) -> InstallerResult<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}

/// 1-based menu choice to a 0-based index.
fn parse_choice(input: &str, len: usize) -> Option<usize> {
    input
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}

fn is_back(input: &str) -> bool {
    matches!(input, "b" | "B" | "q" | "Q" | "<")
}
