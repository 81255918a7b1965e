use super::policy::*;
use super::Environment;
use display::*;
use iced::executor;
use iced::theme::{self, Theme};
use iced::time;
use iced::widget::{button, column, container, row, slider, text};
use iced::{Alignment, Application, Command, Element, Length, Settings, Subscription};
use std::time::Duration;

pub type Result = iced::Result;

/// Plays a policy against a shop environment, one step per tick.
pub struct WebShopApp {
    display: Display,
    is_playing: bool,
    queued_ticks: usize,
    speed: usize,
    next_speed: Option<usize>,
    version: usize,
}

#[derive(Debug, Clone)]
pub enum Message {
    Display(display::Message, usize),
    Tick,
    TogglePlayback,
    Next,
    SpeedChanged(f32),
    Reset,
}

impl Application for WebShopApp {
    type Message = Message;
    type Theme = Theme;
    type Executor = executor::Default;
    type Flags = EnvironmentProxyFlags;

    fn new(flags: EnvironmentProxyFlags) -> (Self, Command<Message>) {
        (
            Self {
                display: Display::new(flags),
                is_playing: Default::default(),
                queued_ticks: Default::default(),
                speed: 2,
                next_speed: Default::default(),
                version: Default::default(),
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        format!("WebShop - {}", self.display.name())
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::Display(message, version) => {
                if version == self.version {
                    self.display.update(message);
                }
            }
            Message::Tick | Message::Next => {
                self.queued_ticks = (self.queued_ticks + 1).min(self.speed);

                if let Some(task) = self.display.tick(self.queued_ticks) {
                    if let Some(speed) = self.next_speed.take() {
                        self.speed = speed;
                    }

                    self.queued_ticks = 0;

                    let version = self.version;

                    return Command::perform(task, move |message| {
                        Message::Display(message, version)
                    });
                }
            }
            Message::TogglePlayback => {
                self.is_playing = !self.is_playing;
            }
            Message::SpeedChanged(speed) => {
                if self.is_playing {
                    self.next_speed = Some(speed.round() as usize);
                } else {
                    self.speed = speed.round() as usize;
                }
            }
            Message::Reset => {
                self.version += 1;
                self.display.reset();
            }
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.is_playing {
            time::every(Duration::from_millis(1000 / self.speed as u64)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn view(&self) -> Element<Message> {
        let version = self.version;
        let selected_speed = self.next_speed.unwrap_or(self.speed);
        let controls = Self::view_controls(self.is_playing, selected_speed);

        let content = column![
            self.display
                .view()
                .map(move |message| Message::Display(message, version)),
            controls,
        ]
        .height(Length::Fill);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

impl WebShopApp {
    pub fn run(
        env: Box<dyn Environment>,
        reset_seed: Option<u64>,
        policy: Box<dyn Policy>,
    ) -> iced::Result {
        // the runner may have installed its own subscriber already
        let _ = tracing_subscriber::fmt().try_init();

        <Self as Application>::run(Settings {
            antialiasing: true,
            window: iced::window::Settings {
                position: iced::window::Position::Centered,
                size: iced::Size {
                    height: 720.,
                    width: 1000.,
                },
                ..iced::window::Settings::default()
            },
            ..Settings::with_flags(EnvironmentProxyFlags {
                env,
                reset_seed,
                policy,
            })
        })
    }

    fn view_controls<'a>(is_playing: bool, speed: usize) -> Element<'a, Message> {
        let playback_controls = row![
            button(if is_playing { "Pause" } else { "Play" }).on_press(Message::TogglePlayback),
            button("Next")
                .on_press_maybe((!is_playing).then_some(Message::Next))
                .style(theme::Button::Secondary),
        ]
        .spacing(10);

        let speed_controls = row![
            slider(1.0..=10.0, speed as f32, Message::SpeedChanged),
            text(format!("{speed} steps/s")).size(16),
        ]
        .align_items(Alignment::Center)
        .spacing(10);

        row![
            playback_controls,
            speed_controls,
            button("Reset")
                .on_press_maybe((!is_playing).then_some(Message::Reset))
                .style(theme::Button::Destructive)
        ]
        .padding(10)
        .spacing(20)
        .align_items(Alignment::Center)
        .into()
    }
}

pub mod display {
    use super::super::common::utils::image_to_rgba;
    use super::super::{policy::Policy, Environment, Observation, RenderFrame, RenderMode};
    use iced::widget::{column, text};
    use iced::{Element, Length};
    use image::RgbImage;
    use std::future::Future;
    use std::time::{Duration, Instant};
    use tracing::{error, info};

    pub struct Display {
        state: State,
        last_tick_duration: Duration,
        last_queued_ticks: usize,
    }

    #[derive(Debug, Clone)]
    pub enum Message {
        Ticked {
            result: Result<(), TickError>,
            tick_duration: Duration,
        },
    }

    #[derive(Debug, Clone)]
    pub enum TickError {
        JoinFailed,
    }

    impl Display {
        pub fn new(flags: EnvironmentProxyFlags) -> Self {
            let env = EnvironmentProxy::new(flags);

            Self {
                state: State::with_env(env),
                last_tick_duration: Duration::default(),
                last_queued_ticks: 0,
            }
        }

        pub fn tick(&mut self, amount: usize) -> Option<impl Future<Output = Message>> {
            let tick = self.state.tick(amount)?;

            self.last_queued_ticks = amount;

            Some(async move {
                let start = Instant::now();
                let result = tick.await;
                let tick_duration = start.elapsed() / amount as u32;

                Message::Ticked {
                    result,
                    tick_duration,
                }
            })
        }

        pub fn reset(&mut self) {
            self.state.reset();
        }

        pub fn name(&self) -> &str {
            self.state.name()
        }

        pub fn update(&mut self, message: Message) {
            match message {
                Message::Ticked {
                    result: Ok(()),
                    tick_duration,
                } => {
                    self.state.update();

                    self.last_tick_duration = tick_duration;
                }
                Message::Ticked {
                    result: Err(error), ..
                } => {
                    error!("tick failed: {error:?}");
                }
            }
        }

        pub fn view(&self) -> Element<Message> {
            let env = &self.state.env;
            let header = column![
                text(env.location()).size(16),
                text(env.instruction()).size(14),
                text(format!(
                    "steps: {}  return: {:.3}  last step: {}ms",
                    env.steps,
                    env.episode_return,
                    self.last_tick_duration.as_millis()
                ))
                .size(12),
            ]
            .spacing(4)
            .padding(10);

            let frame: Element<Message> = match &env.frame {
                Some(img) => {
                    let handle = iced::widget::image::Handle::from_pixels(
                        img.width(),
                        img.height(),
                        image_to_rgba(img),
                    );
                    iced::widget::Image::new(handle)
                        .width(Length::Fill)
                        .height(Length::Fill)
                        .into()
                }
                None => text(env.last_error.as_deref().unwrap_or("No frame")).into(),
            };

            let content = column![header, frame];

            iced::widget::container(content)
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x()
                .into()
        }
    }

    struct State {
        env: EnvironmentProxy,
        is_ticking: bool,
    }

    impl State {
        pub fn with_env(env: EnvironmentProxy) -> Self {
            Self {
                env,
                is_ticking: Default::default(),
            }
        }

        pub fn reset(&mut self) {
            self.env.reset();
        }

        pub fn name(&self) -> &str {
            self.env.name()
        }

        fn update(&mut self) {
            self.is_ticking = false;
        }

        fn tick(&mut self, amount: usize) -> Option<impl Future<Output = Result<(), TickError>>> {
            if self.is_ticking {
                return None;
            }

            self.is_ticking = true;

            for _ in 0..amount {
                self.env.tick();
            }

            Some(async move {
                tokio::task::spawn_blocking(move || ())
                    .await
                    .map_err(|_| TickError::JoinFailed)
            })
        }
    }

    pub struct EnvironmentProxyFlags {
        pub env: Box<dyn Environment>,
        pub reset_seed: Option<u64>,
        pub policy: Box<dyn Policy>,
    }

    pub struct EnvironmentProxy {
        env: Box<dyn Environment>,
        session: String,
        reset_seed: Option<u64>,
        last_observation: Option<Observation>,
        policy: Box<dyn Policy>,
        frame: Option<RgbImage>,
        last_error: Option<String>,
        steps: usize,
        episode_return: f64,
    }

    impl EnvironmentProxy {
        pub fn new(flags: EnvironmentProxyFlags) -> Self {
            let mut proxy = Self {
                env: flags.env,
                session: String::new(),
                reset_seed: flags.reset_seed,
                last_observation: None,
                policy: flags.policy,
                frame: None,
                last_error: None,
                steps: 0,
                episode_return: 0.,
            };
            proxy.reset();
            proxy
        }

        pub fn tick(&mut self) {
            let count = match self.env.action_count() {
                Ok(count) => count,
                Err(e) => return self.fail(e),
            };
            let Some(observation) = &self.last_observation else {
                self.reset();
                return;
            };
            let action = self.policy.policy(observation, count);

            match self.env.step(action) {
                Ok(si) => {
                    self.steps += 1;
                    self.episode_return += si.reward;
                    let done = si.done;
                    self.last_observation = Some(si.observation);
                    self.refresh_frame();
                    if done {
                        info!(
                            steps = self.steps,
                            episode_return = self.episode_return,
                            "episode finished"
                        );
                        self.reset();
                    }
                }
                Err(e) => self.fail(e),
            }
        }

        pub fn reset(&mut self) {
            self.steps = 0;
            self.episode_return = 0.;
            match self.env.reset(self.reset_seed) {
                Ok((observation, _)) => {
                    self.session = self.env.session().unwrap_or_default().to_string();
                    self.last_observation = Some(observation);
                    self.refresh_frame();
                }
                Err(e) => self.fail(e),
            }
        }

        pub fn name(&self) -> &str {
            &self.session
        }

        fn location(&self) -> String {
            self.last_observation
                .as_ref()
                .map(|o| o.url.clone())
                .unwrap_or_default()
        }

        fn instruction(&self) -> String {
            self.last_observation
                .as_ref()
                .map(|o| o.instruction_text.clone())
                .unwrap_or_default()
        }

        fn refresh_frame(&mut self) {
            match self.env.render(RenderMode::RgbArray) {
                Ok(RenderFrame::Rgb(img)) => self.frame = Some(img),
                Ok(RenderFrame::Ansi(_)) => self.frame = None,
                Err(e) => self.fail(e),
            }
        }

        fn fail(&mut self, e: crate::Error) {
            error!("environment failed: {e}");
            self.last_error = Some(e.to_string());
            self.frame = None;
        }
    }
}
