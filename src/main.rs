#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

// Built for the board this is the crossing firmware. Built for the host it
// runs a scripted desk simulation of the same monitors instead.

#[cfg(target_os = "none")]
mod io;

#[cfg(not(target_os = "none"))]
mod desk;

#[cfg(target_os = "none")]
use {
    defmt_rtt as _,
    embassy_executor::Spawner,
    embassy_stm32::gpio::{Input, Level, Output, Pull, Speed},
    embassy_stm32::usart::{Config, Uart},
    embassy_stm32::{bind_interrupts, peripherals, usart},
    embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel},
    embassy_time::{Duration, Ticker},
    io::{CHANNEL_CAPACITY, FirmwareActuator, OutputCommand, StatusPort, StatusSignal, now_ms},
    panic_halt as _,
    pedestrian_crossing::config::{CONTROLLER_POLL_MS, POLICY, SENSOR_COUNT},
    pedestrian_crossing::error::DisplayError,
    pedestrian_crossing::{
        CrossingController, MotionCorrelator, SharedEventState, log_error, log_info,
    },
};

#[cfg(target_os = "none")]
static SHARED: SharedEventState = SharedEventState::new();
#[cfg(target_os = "none")]
static OUTPUT_COMMANDS: Channel<ThreadModeRawMutex, OutputCommand, CHANNEL_CAPACITY> =
    Channel::new();
#[cfg(target_os = "none")]
static STATUS: StatusSignal = StatusSignal::new();
#[cfg(target_os = "none")]
static STATUS_PORT: StatusPort = StatusPort::new();

#[cfg(target_os = "none")]
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let peripherals = embassy_stm32::init(Default::default());

    bind_interrupts!(struct Irqs {
        USART1 => usart::InterruptHandler<peripherals::USART1>;
    });
    match Uart::new(
        peripherals.USART1,
        peripherals.PA10,
        peripherals.PA9,
        Irqs,
        peripherals.DMA1_CH4,
        peripherals.DMA1_CH5,
        Config::default(), // 115200 baud
    ) {
        Ok(usart) => STATUS_PORT.attach(usart).await,
        Err(_) => log_error!("status display: {:?}", DisplayError::Init),
    }
    if let Err(error) = STATUS_PORT.write(b"=== pedestrian crossing ===\r\n").await {
        log_error!("status display: {:?}", error);
    }

    // Indexed by `timed_output_masker::Pins`.
    let outputs = [
        Output::new(peripherals.PE1, Level::Low, Speed::Low),
        Output::new(peripherals.PB9, Level::Low, Speed::Low),
        Output::new(peripherals.PB7, Level::Low, Speed::Low),
        Output::new(peripherals.PB8, Level::Low, Speed::Low),
    ];

    // The button pulls the line low when pressed.
    let button = Input::new(peripherals.PE11, Pull::Up);

    #[cfg(not(feature = "single-sensor"))]
    let sensors = [
        Input::new(peripherals.PB6, Pull::Down),
        Input::new(peripherals.PE0, Pull::Down),
    ];
    #[cfg(feature = "single-sensor")]
    let sensors = [Input::new(peripherals.PB6, Pull::Down)];

    spawner
        .spawn(io::io_task(outputs, OUTPUT_COMMANDS.receiver()))
        .unwrap();
    spawner.spawn(io::display_task(&STATUS_PORT, &STATUS)).unwrap();
    spawner.spawn(io::button_task(button, &SHARED)).unwrap();
    spawner
        .spawn(io::motion_task(
            sensors,
            MotionCorrelator::<SENSOR_COUNT>::new(POLICY),
            &SHARED,
        ))
        .unwrap();

    // The controller runs in the main task.
    let actuator = FirmwareActuator::new(OUTPUT_COMMANDS.sender(), &STATUS);
    let mut controller = CrossingController::new(POLICY, actuator);
    controller.start(now_ms(), SENSOR_COUNT);
    log_info!("crossing running");

    let mut ticker = Ticker::every(Duration::from_millis(CONTROLLER_POLL_MS));
    loop {
        ticker.next().await;
        controller.step(now_ms(), &SHARED);
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    desk::run();
}
