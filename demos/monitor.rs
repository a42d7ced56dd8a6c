use std::env;
use std::time::Duration;

use remo_aircon::{AcController, Coordinator, RemoClient};

#[tokio::main]
async fn main() -> remo_aircon::Result<()> {
    tracing_subscriber::fmt::init();

    let token = env::var("REMO_TOKEN")
        .expect("usage: REMO_TOKEN=<access token> monitor [appliance-id]");
    let api = RemoClient::builder(token).build();

    let args: Vec<String> = env::args().collect();
    let appliance_id = match args.get(1) {
        Some(id) => id.clone(),
        None => {
            println!("No appliance id given; air conditioners on this account:");
            for appliance in api.list_appliances().await?.iter().filter(|a| a.is_aircon()) {
                println!("  {}  {}", appliance.id, appliance.nickname);
            }
            return Ok(());
        }
    };

    let coordinator = Coordinator::builder(api, appliance_id)
        .poll_interval(Duration::from_secs(60))
        .on_capabilities_changed(|model| {
            println!("capabilities changed: {:?}", model.mode_order);
        })
        .on_snapshot(|raw| {
            if let Some(settings) = &raw.settings {
                println!(
                    "vendor state: mode={} temp={} vol={} button={}",
                    settings.mode, settings.temp, settings.vol, settings.button
                );
            }
        })
        .build();

    coordinator.refresh().await;
    let mut controller = AcController::new(coordinator.clone());
    controller.reconcile();
    print_state(&controller);

    let _poller = coordinator.spawn();
    loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        controller.reconcile();
        print_state(&controller);
    }
}

fn print_state(controller: &AcController) {
    println!(
        "mode: {:?} | target: {:?} ({:.1}..{:.1}) | fan: {:?} | swing h/v: {:?}/{:?} | available: {}",
        controller.mode(),
        controller.target_temperature(),
        controller.min_temp(),
        controller.max_temp(),
        controller.fan_setting(),
        controller.horizontal_swing(),
        controller.vertical_swing(),
        controller.available(),
    );
}
