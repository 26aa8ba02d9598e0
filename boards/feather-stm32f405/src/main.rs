#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;

mod config;
mod hardware;
mod wifi;

#[app(device = embassy_stm32, peripherals = true, dispatchers = [UART4, UART5])]
mod app {
    use super::*;
    use defmt::{error, info};
    use embassy_futures::join::join3;
    use embassy_stm32::adc::{Adc, AdcChannel as _, SampleTime};
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Level, Output, Pull, Speed};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;
    use embassy_stm32::usart::{self, BufferedUart};
    use embassy_time::Delay;
    use static_cell::StaticCell;
    use voltnode_core::telemetry::startup_signal;
    use voltnode_core::{
        CalibrationBench, ConnectionManager, LoraTransport, NodeTransport, Sampler,
        TelemetryLoop, TransportKind, WifiTransport,
    };

    use hardware::{AdcInput, ChipReset, RadioUart, StatusLed};
    use wifi::{EspStation, UdpSender};

    type NodeSampler =
        Sampler<AdcInput<peripherals::ADC1>, AdcInput<peripherals::ADC2>, Output<'static>>;

    type BoardTransport = NodeTransport<
        EspStation,
        UdpSender,
        ChipReset,
        RadioUart<BufferedUart<'static>>,
        StatusLed,
        Delay,
    >;

    type Pin<P> = embassy_stm32::Peri<'static, P>;

    /// SPI2 link to the ESP32 co-processor
    struct EspPins {
        spi: Pin<peripherals::SPI2>,
        sck: Pin<peripherals::PB13>,
        mosi: Pin<peripherals::PB15>,
        miso: Pin<peripherals::PB14>,
        cs: Pin<peripherals::PC6>,
        reset: Pin<peripherals::PC3>,
        handshake: Pin<peripherals::PC2>,
        handshake_exti: Pin<peripherals::EXTI2>,
        ready: Pin<peripherals::PB8>,
        ready_exti: Pin<peripherals::EXTI8>,
        dma_tx: Pin<peripherals::DMA1_CH4>,
        dma_rx: Pin<peripherals::DMA1_CH3>,
    }

    /// USART3 on the Feather's TX/RX header pins
    struct LoraPins {
        usart: Pin<peripherals::USART3>,
        tx: Pin<peripherals::PB10>,
        rx: Pin<peripherals::PB11>,
    }

    struct NodePeripherals {
        sampler: NodeSampler,
        led: StatusLed,
        esp: EspPins,
        lora: LoraPins,
    }

    embassy_stm32::bind_interrupts!(struct UartIrqs {
        USART3 => usart::BufferedInterruptHandler<peripherals::USART3>;
    });

    const LORA_BAUD: u32 = 115_200;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {}

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("voltnode starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: None,
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        let p = embassy_stm32::init(config);
        info!("System initialized: SYSCLK=84MHz from HSE");

        // A0 (PA4) senses the divider, A1 (PA5) is tied to analog ground
        let mut adc1 = Adc::new(p.ADC1);
        adc1.set_sample_time(SampleTime::CYCLES480);
        let mut adc2 = Adc::new(p.ADC2);
        adc2.set_sample_time(SampleTime::CYCLES480);
        let primary = AdcInput::new(adc1, p.PA4.degrade_adc());
        let reference = AdcInput::new(adc2, p.PA5.degrade_adc());

        // D6 switches the auxiliary supply into low-noise mode
        let gate = Output::new(p.PC7, Level::Low, Speed::Low);
        let led = StatusLed(Output::new(p.PC1, Level::Low, Speed::Low));

        let periph = NodePeripherals {
            sampler: Sampler::new(primary, reference, gate),
            led,
            esp: EspPins {
                spi: p.SPI2,
                sck: p.PB13,
                mosi: p.PB15,
                miso: p.PB14,
                cs: p.PC6,
                reset: p.PC3,
                handshake: p.PC2,
                handshake_exti: p.EXTI2,
                ready: p.PB8,
                ready_exti: p.EXTI8,
                dma_tx: p.DMA1_CH4,
                dma_rx: p.DMA1_CH3,
            },
            lora: LoraPins {
                usart: p.USART3,
                tx: p.PB10,
                rx: p.PB11,
            },
        };

        node_task::spawn(periph).ok();

        (Shared {}, Local {})
    }

    /// Node task - startup signal, then calibration bench or telemetry
    ///
    /// The network stack is !Send and must remain within this task.
    #[task(priority = 1)]
    async fn node_task(_cx: node_task::Context, periph: NodePeripherals) -> ! {
        let NodePeripherals {
            sampler,
            mut led,
            esp,
            lora,
        } = periph;
        let cfg = config::node_config();
        info!("Device {} using {} transport", cfg.device_id, cfg.transport);

        startup_signal(&mut led, &mut Delay).await;

        if cfg!(feature = "calibration") {
            info!("Calibration mode");
            CalibrationBench::new(sampler, Delay).run().await;
        }

        match cfg.transport {
            TransportKind::Lora => {
                let uart = open_radio_uart(lora);
                let transport: BoardTransport = NodeTransport::Lora(LoraTransport::new(
                    RadioUart(uart),
                    led,
                    Delay,
                    cfg.device_id,
                    cfg.lora,
                ));
                TelemetryLoop::new(sampler, transport, Delay, cfg.device_id)
                    .run()
                    .await
            }
            TransportKind::Wifi => {
                use embassy_net::{Config, StackResources};

                let (device, control, esp_runner) =
                    wifi::init_esp_hosted(open_esp_link(esp)).await;

                static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
                let (stack, mut net_runner) = embassy_net::new(
                    device,
                    Config::dhcpv4(Default::default()),
                    RESOURCES.init(StackResources::new()),
                    0x1234_5678_u64 ^ u64::from(cfg.device_id),
                );
                info!("Network stack initialized with DHCP");

                let app_logic = async move {
                    let socket = match UdpSender::bind(stack) {
                        Ok(socket) => socket,
                        Err(e) => {
                            error!("Cannot open telemetry socket: {}", e);
                            cortex_m::peripheral::SCB::sys_reset()
                        }
                    };
                    let link = ConnectionManager::new(
                        EspStation::new(control, stack),
                        ChipReset,
                        cfg.wifi,
                        cfg.collector,
                    );
                    let transport: BoardTransport =
                        NodeTransport::Wifi(WifiTransport::new(link, socket, led, Delay));
                    TelemetryLoop::new(sampler, transport, Delay, cfg.device_id)
                        .run()
                        .await
                };

                let (never, _, _) = join3(esp_runner.run(), net_runner.run(), app_logic).await;
                never
            }
        }
    }

    fn open_esp_link(pins: EspPins) -> wifi::EspPeripherals<'static> {
        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000);
        spi_config.mode = spi::MODE_2;

        let spi = Spi::new(
            pins.spi,
            pins.sck,
            pins.mosi,
            pins.miso,
            pins.dma_tx,
            pins.dma_rx,
            spi_config,
        );

        wifi::EspPeripherals {
            spi,
            cs: Output::new(pins.cs, Level::High, Speed::VeryHigh),
            reset: Output::new(pins.reset, Level::Low, Speed::Low),
            handshake: ExtiInput::new(pins.handshake, pins.handshake_exti, Pull::Up),
            ready: ExtiInput::new(pins.ready, pins.ready_exti, Pull::None),
        }
    }

    fn open_radio_uart(pins: LoraPins) -> BufferedUart<'static> {
        static TX_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
        static RX_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();

        let mut uart_config = usart::Config::default();
        uart_config.baudrate = LORA_BAUD;

        match BufferedUart::new(
            pins.usart,
            pins.rx,
            pins.tx,
            TX_BUFFER.init([0; 256]),
            RX_BUFFER.init([0; 256]),
            UartIrqs,
            uart_config,
        ) {
            Ok(uart) => uart,
            Err(e) => {
                error!("Radio UART rejected its config: {}", defmt::Debug2Format(&e));
                cortex_m::peripheral::SCB::sys_reset()
            }
        }
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        info!("Idle task started - entering WFI loop");
        loop {
            cortex_m::asm::wfi();
        }
    }
}
