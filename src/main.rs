use maxwell_stereo::{config::DemoConfig, flow};

fn main() -> anyhow::Result<()> {
    flow::run(DemoConfig::default())
}
