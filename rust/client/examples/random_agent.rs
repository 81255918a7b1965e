extern crate webshop_gym;

use webshop_gym::*;

// NOTE: Expects the shop on http://127.0.0.1:3000, see `EnvConfig` for how to
// launch it instead.

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = ConfigLoader::new().load()?;
    let mut env = make_env(config)?;
    let policy = RandomPolicy::new(Some(2718));

    let (mut observation, info) = env.reset(Some(2718))?;
    println!("{info}");

    for _ in 0..10 {
        if let RenderFrame::Ansi(frame) = env.render(RenderMode::Ansi)? {
            println!("{frame}\n");
        }

        let action = policy.policy(&observation, env.action_count()?);
        let si = env.step(action)?;
        println!("action: {action}, reward: {}, done: {}", si.reward, si.done);
        if si.done {
            break;
        }
        observation = si.observation;
    }

    env.close()
}
