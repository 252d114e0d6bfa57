use std::{
    io::{self, BufRead, Write},
    str::FromStr,
    thread,
    time::Duration,
};

use follow_me_core::{
    Feature, FollowMeError, Frame, Haptics, Mode, Narrator, Outcome, SpeedAdjust, Storage,
    Trainer, TrainerEvent,
};

/// Narration printed to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleNarrator;

impl Narrator for ConsoleNarrator {
    fn speak(&mut self, text: &str) -> follow_me_core::Result<()> {
        println!("  ♪ {text}");
        Ok(())
    }
}

/// Terminals cannot vibrate; pulses are only traced.
#[derive(Debug, Default)]
pub struct TracedHaptics;

impl Haptics for TracedHaptics {
    fn vibrate(&mut self, duration: Duration) -> follow_me_core::Result<()> {
        tracing::trace!(?duration, "haptic pulse");
        Ok(())
    }
}

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Values(Vec<String>),
    Undo,
    /// Hold backspace for the given time.
    Hold(Duration),
    Play,
    Mode(Mode),
    Speed(SpeedAdjust),
    SlideSpeed(f32),
    Scale(f32),
    Toggle(Feature),
    Tracks(usize),
    Chunk(usize),
    Gap(Duration),
    ResetRounds,
    Defaults,
    Show,
    Help,
    Quit,
}

fn parse_arg<T: FromStr>(arg: Option<&str>, what: &'static str) -> follow_me_core::Result<T> {
    arg.and_then(|value| value.parse().ok())
        .ok_or(FollowMeError::InvalidInput(what))
}

fn parse_percent(arg: Option<&str>) -> follow_me_core::Result<f32> {
    let percent: f32 = parse_arg(
        arg.map(|value| value.trim_end_matches('%')),
        "expected a percentage",
    )?;
    Ok(percent / 100.0)
}

impl FromStr for Command {
    type Err = FollowMeError;

    fn from_str(line: &str) -> follow_me_core::Result<Self> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Show);
        };
        let arg = words.next();

        let command = match head.to_ascii_lowercase().as_str() {
            "undo" | "back" | "u" => Command::Undo,
            "hold" => {
                Command::Hold(Duration::from_millis(parse_arg(arg, "expected milliseconds")?))
            }
            "play" | "demo" | "p" => Command::Play,
            "mode" => Command::Mode(parse_arg::<Mode>(arg, "expected bananas, piano or rounds15")?),
            "speed" => match arg {
                Some("reset") => Command::Speed(SpeedAdjust::Reset),
                other => Command::Speed(SpeedAdjust::By(
                    parse_arg::<f32>(other, "expected a change in percent")? / 100.0,
                )),
            },
            "slide" => Command::SlideSpeed(parse_percent(arg)?),
            "scale" => Command::Scale(parse_percent(arg)?),
            "toggle" => Command::Toggle(
                arg.ok_or(FollowMeError::InvalidInput("expected a feature"))?
                    .parse()?,
            ),
            "tracks" => Command::Tracks(parse_arg(arg, "expected 1 to 4")?),
            "chunk" => Command::Chunk(parse_arg(arg, "expected a chunk size")?),
            "gap" => Command::Gap(Duration::from_millis(parse_arg(arg, "expected milliseconds")?)),
            "reset" => Command::ResetRounds,
            "defaults" => Command::Defaults,
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Values(line.split_whitespace().map(str::to_uppercase).collect()),
        };
        Ok(command)
    }
}

const HELP: &str = "\
values      1 2 3 / C D 4 ...  enter values for the active mode
undo        remove the last value
hold MS     hold backspace for MS milliseconds
play        replay the active sequences
mode NAME   bananas | piano | rounds15
speed +N|-N|reset, slide N%, scale N%
toggle F    dark-mode speed-delete piano-autoplay bananas-autoplay rounds15-clear
            audio voice-input slider-lock haptics welcome
tracks N, chunk N, gap MS, reset (rounds), defaults, show, quit";

/// How timers are driven between commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    RealTime,
    Instant,
}

pub struct Session<S> {
    trainer: Trainer<S>,
    pace: Pace,
}

impl<S: Storage> Session<S> {
    pub fn new(trainer: Trainer<S>, pace: Pace) -> Self {
        Self { trainer, pace }
    }

    /// Reads commands from `input` until it ends or the user quits.
    pub fn run(&mut self, input: impl BufRead) -> follow_me_core::Result<()> {
        if self.trainer.settings().show_welcome {
            println!("Welcome to Follow Me. Type `help` for commands.");
            self.trainer.dismiss_welcome(false);
        }
        self.report();
        prompt()?;

        for line in input.lines() {
            let line = line?;
            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command),
                Err(err) => println!("  ! {err}"),
            }
            self.settle();
            self.report();
            prompt()?;
        }
        Ok(())
    }

    pub fn execute(&mut self, command: Command) {
        let outcome = match command {
            Command::Values(values) => {
                for value in values {
                    let outcome = self.trainer.append(&value);
                    if let Outcome::Ignored(guard) = outcome {
                        tracing::debug!(%value, ?guard, "value ignored");
                    }
                    self.drive(Duration::ZERO);
                }
                Outcome::Applied
            }
            Command::Undo => self.trainer.undo(),
            Command::Hold(duration) => {
                let pressed = self.trainer.press_delete();
                self.drive(duration);
                let released = self.trainer.release_delete();
                if pressed.is_applied() { released } else { pressed }
            }
            Command::Play => self.trainer.play(),
            Command::Mode(mode) => self.trainer.switch_mode(mode),
            Command::Speed(adjust) => {
                self.trainer.adjust_speed(adjust);
                Outcome::Applied
            }
            Command::SlideSpeed(multiplier) => {
                let mode = self.trainer.mode();
                self.trainer.slide_speed(mode, multiplier)
            }
            Command::Scale(multiplier) => self.trainer.slide_ui_scale(multiplier),
            Command::Toggle(feature) => {
                let enabled = self.trainer.toggle(feature);
                println!("  {} {}", feature.name(), if enabled { "on" } else { "off" });
                Outcome::Applied
            }
            Command::Tracks(count) => self.trainer.set_sequence_count(count),
            Command::Chunk(size) => self.trainer.set_chunk_size(size),
            Command::Gap(delay) => {
                self.trainer.set_inter_sequence_delay(delay);
                Outcome::Applied
            }
            Command::ResetRounds => self.trainer.reset_rounds(),
            Command::Defaults => {
                self.trainer.restore_defaults();
                Outcome::Applied
            }
            Command::Show | Command::Quit => Outcome::Applied,
            Command::Help => {
                println!("{HELP}");
                Outcome::Applied
            }
        };

        if let Outcome::Ignored(guard) = outcome {
            println!("  (ignored: {guard:?})");
        }
    }

    /// Runs pending timers for `duration`, honouring the pace.
    fn drive(&mut self, duration: Duration) {
        let mut remaining = duration;
        loop {
            let step = match self.trainer.next_deadline() {
                Some(deadline) if deadline <= remaining => deadline,
                _ => remaining,
            };
            if self.pace == Pace::RealTime && !step.is_zero() {
                thread::sleep(step);
            }
            self.trainer.advance(step);
            self.print_events();
            remaining -= step;
            if remaining.is_zero() {
                break;
            }
        }
    }

    /// Runs timers until nothing is pending.
    fn settle(&mut self) {
        while let Some(deadline) = self.trainer.next_deadline() {
            self.drive(deadline);
        }
    }

    fn print_events(&mut self) {
        for event in self.trainer.drain_events() {
            match event {
                TrainerEvent::ItemShown {
                    position,
                    sequence_index,
                    value,
                    ..
                } => println!("  {:>2}. track {} -> {value}", position + 1, sequence_index + 1),
                TrainerEvent::RoundAdvanced { round } => println!("  Round {round}"),
                TrainerEvent::Notice(notice) => println!("  ! {notice}"),
                TrainerEvent::PlaybackFinished(mode) => {
                    tracing::debug!(%mode, "playback finished")
                }
                _ => {}
            }
        }
    }

    fn report(&mut self) {
        self.print_events();
        print!("{}", Frame::capture(&self.trainer));
    }
}

fn prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}

#[cfg(test)]
mod tests {
    use follow_me_core::{MemoryStorage, PlaybackStatus};

    use super::*;

    fn session() -> Session<MemoryStorage> {
        Session::new(Trainer::load(MemoryStorage::new()), Pace::Instant)
    }

    #[test]
    fn parses_commands() {
        assert_eq!("undo".parse::<Command>().unwrap(), Command::Undo);
        assert_eq!(
            "hold 400".parse::<Command>().unwrap(),
            Command::Hold(Duration::from_millis(400))
        );
        assert_eq!("mode piano".parse::<Command>().unwrap(), Command::Mode(Mode::Piano));
        assert_eq!(
            "speed -25".parse::<Command>().unwrap(),
            Command::Speed(SpeedAdjust::By(-0.25))
        );
        assert_eq!("scale 80%".parse::<Command>().unwrap(), Command::Scale(0.8));
        assert_eq!(
            "toggle audio".parse::<Command>().unwrap(),
            Command::Toggle(Feature::Audio)
        );
        assert_eq!(
            "c d 4".parse::<Command>().unwrap(),
            Command::Values(vec!["C".into(), "D".into(), "4".into()])
        );
        assert_eq!("".parse::<Command>().unwrap(), Command::Show);
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!("hold".parse::<Command>().is_err());
        assert!("mode drums".parse::<Command>().is_err());
        assert!("toggle".parse::<Command>().is_err());
        assert!("tracks many".parse::<Command>().is_err());
    }

    #[test]
    fn executes_values_and_settles_playback() {
        let mut session = session();
        session.execute(Command::Values(vec!["1".into(), "2".into()]));
        session.settle();

        let trainer = &session.trainer;
        assert_eq!(trainer.active_state().sequences[0], vec!["1", "2"]);
        assert_eq!(trainer.playback_status(Mode::Bananas), PlaybackStatus::Idle);
    }

    #[test]
    fn hold_command_presses_and_releases() {
        let mut session = session();
        session.execute(Command::Toggle(Feature::BananasAutoplay));
        session.execute(Command::Values(vec!["1".into(), "2".into(), "3".into(), "4".into()]));
        session.execute(Command::Hold(Duration::from_millis(100)));
        assert_eq!(session.trainer.active_state().sequences[0].len(), 3);
    }

    #[test]
    fn runs_scripted_input() {
        let mut session = session();
        let script = "mode rounds15\n5\nquit\n9\n";
        session.run(script.as_bytes()).unwrap();

        let trainer = &session.trainer;
        assert_eq!(trainer.mode(), Mode::Rounds15);
        assert_eq!(trainer.state(Mode::Rounds15).current_round, Some(2));
        assert!(trainer.state(Mode::Rounds15).sequences[0].is_empty());
    }
}
