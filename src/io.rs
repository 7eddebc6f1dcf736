/*
 * The I/O tasks of the crossing.
 *
 * This module holds everything that touches the device: the output task that
 * owns the light and buzzer pins, the polling tasks for the button and the
 * motion sensors, and the status display. The intention is for this module to
 * be the only part of the program that is device-specific. All decisions are
 * made by the library; the tasks here only sample pins, keep time, and carry
 * results to where they are needed.
 */

use core::fmt::Write;

use embassy_futures::select::{Either, select};
use embassy_stm32::gpio::{Input, Level, Output};
use embassy_stm32::mode::Async;
use embassy_stm32::usart::Uart;
use embassy_sync::{
    blocking_mutex::raw::ThreadModeRawMutex,
    channel::{Receiver, Sender},
    mutex::Mutex,
    signal::Signal,
};
use embassy_time::{Duration, Instant, Ticker, with_timeout};
use enum_ordinalize::Ordinalize;

use pedestrian_crossing::config::{
    BUTTON_POLL_MS, OUTPUT_TICK_MS, SENSOR_COUNT, STATUS_LOCK_TIMEOUT_MS, motion_poll_ms,
};
use pedestrian_crossing::error::DisplayError;
use pedestrian_crossing::status::LINE_WIDTH;
use pedestrian_crossing::timed_output_masker::{Pins, TimedOutputMasker};
use pedestrian_crossing::{
    ButtonEvent, InputDebouncer, Lights, MotionCorrelator, OutputActuator, SharedEventState,
    StatusLines, log_debug, log_info, log_warn,
};

pub const CHANNEL_CAPACITY: usize = 4;

// All outputs on this board are active-high.
const ACTIVE_LOWS: [bool; Pins::VARIANT_COUNT] = [false; Pins::VARIANT_COUNT];

#[derive(Copy, Clone)]
pub enum OutputCommand {
    Lights(Lights),
    Buzzer(bool),
}

pub type OutputCommands = Receiver<'static, ThreadModeRawMutex, OutputCommand, CHANNEL_CAPACITY>;
pub type StatusSignal = Signal<ThreadModeRawMutex, StatusLines>;

pub fn now_ms() -> u64 {
    Instant::now().as_millis()
}

/*
 * The output task is the only owner of the light and buzzer pins, indexed by
 * `Pins`. Between commands it ticks the masker, which is what makes the buzzer
 * beep.
 */
#[embassy_executor::task]
pub async fn io_task(
    mut outputs: [Output<'static>; Pins::VARIANT_COUNT],
    commands: OutputCommands,
) -> ! {
    let mut masker = TimedOutputMasker::new(ACTIVE_LOWS);
    let mut ticker = Ticker::every(Duration::from_millis(OUTPUT_TICK_MS));

    loop {
        let levels = match select(commands.receive(), ticker.next()).await {
            Either::First(OutputCommand::Lights(lights)) => {
                masker.set_lights(lights);
                masker.outputs()
            }
            Either::First(OutputCommand::Buzzer(on)) => {
                masker.set_buzzer(on);
                masker.outputs()
            }
            Either::Second(_) => masker.call_every_tick(),
        };

        for (output, on) in outputs.iter_mut().zip(levels) {
            output.set_level(if on { Level::High } else { Level::Low });
        }
    }
}

#[embassy_executor::task]
pub async fn button_task(button: Input<'static>, shared: &'static SharedEventState) -> ! {
    log_info!("button task started");

    let mut debouncer = InputDebouncer::new();
    let mut ticker = Ticker::every(Duration::from_millis(BUTTON_POLL_MS));

    loop {
        match debouncer.poll(now_ms(), button.is_high(), shared) {
            Some(ButtonEvent::Requested) => log_info!("press -> crossing requested"),
            Some(ignored) => log_info!("press ignored: {:?}", ignored),
            None => {}
        }
        ticker.next().await;
    }
}

#[embassy_executor::task]
pub async fn motion_task(
    sensors: [Input<'static>; SENSOR_COUNT],
    correlator: MotionCorrelator<SENSOR_COUNT>,
    shared: &'static SharedEventState,
) -> ! {
    // Passive infrared sensors report garbage for the first 30 to 60 seconds.
    log_info!(
        "motion task started with {} sensor(s), warming up",
        SENSOR_COUNT
    );

    let mut correlator = correlator;
    let mut ticker = Ticker::every(Duration::from_millis(motion_poll_ms(SENSOR_COUNT)));

    loop {
        let motion = sensors.each_ref().map(|sensor| sensor.is_high());
        if let Some(event) = correlator.poll(now_ms(), motion, shared) {
            log_info!("illegal crossing flag: {:?}", event);
        }
        ticker.next().await;
    }
}

/*
 * The controller's view of the outputs. Lights and buzzer go to the output
 * task over a channel; status goes to the display task through a signal, which
 * only ever holds the newest screen.
 *
 * The controller asserts its outputs every step. Only changes are queued, and
 * a change that did not fit in the queue stays pending until a later step
 * gets it through.
 */
pub struct FirmwareActuator {
    commands: Sender<'static, ThreadModeRawMutex, OutputCommand, CHANNEL_CAPACITY>,
    status: &'static StatusSignal,
    sent_lights: Option<Lights>,
    sent_buzzer: Option<bool>,
}

impl FirmwareActuator {
    pub fn new(
        commands: Sender<'static, ThreadModeRawMutex, OutputCommand, CHANNEL_CAPACITY>,
        status: &'static StatusSignal,
    ) -> Self {
        Self {
            commands,
            status,
            sent_lights: None,
            sent_buzzer: None,
        }
    }

    fn send(&mut self, command: OutputCommand) -> bool {
        let sent = self.commands.try_send(command).is_ok();
        if !sent {
            log_warn!("output queue full, retrying next step");
        }
        sent
    }
}

impl OutputActuator for FirmwareActuator {
    fn set_lights(&mut self, lights: Lights) {
        if self.sent_lights != Some(lights) && self.send(OutputCommand::Lights(lights)) {
            self.sent_lights = Some(lights);
        }
    }

    fn set_buzzer(&mut self, on: bool) {
        if self.sent_buzzer != Some(on) && self.send(OutputCommand::Buzzer(on)) {
            self.sent_buzzer = Some(on);
        }
    }

    fn show_status(&mut self, status: &StatusLines) {
        self.status.signal(status.clone());
    }
}

/*
 * The status surface is a serial port. It is shared between the boot code and
 * the display task, so every write takes the lock, and gives up if it cannot
 * get it in time. If the port failed to come up, writes are dropped silently.
 */
pub struct StatusPort {
    uart: Mutex<ThreadModeRawMutex, Option<Uart<'static, Async>>>,
}

impl StatusPort {
    pub const fn new() -> Self {
        Self {
            uart: Mutex::new(None),
        }
    }

    pub async fn attach(&self, uart: Uart<'static, Async>) {
        *self.uart.lock().await = Some(uart);
    }

    pub async fn show(&self, status: &StatusLines) -> Result<(), DisplayError> {
        let mut text: heapless::String<{ 3 * LINE_WIDTH + 8 }> = heapless::String::new();
        let _ = write!(text, "{}\r\n", status);
        self.write(text.as_bytes()).await
    }

    pub async fn write(&self, bytes: &[u8]) -> Result<(), DisplayError> {
        let timeout = Duration::from_millis(STATUS_LOCK_TIMEOUT_MS);
        let mut uart = with_timeout(timeout, self.uart.lock())
            .await
            .map_err(|_| DisplayError::LockTimeout)?;

        match uart.as_mut() {
            Some(uart) => uart.write(bytes).await.map_err(|_| DisplayError::Write),
            None => Ok(()),
        }
    }
}

#[embassy_executor::task]
pub async fn display_task(port: &'static StatusPort, status: &'static StatusSignal) -> ! {
    loop {
        let lines = status.wait().await;
        if let Err(error) = port.show(&lines).await {
            log_debug!("status update skipped: {:?}", error);
        }
    }
}
