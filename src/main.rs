use sigref::clean::exit_code;
use sigref::cli::{Cli, Runner};
use sigref::logging::{Logger, init_tracing};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let runner = match Runner::new(cli) {
        Ok(runner) => runner,
        Err(e) => {
            Logger::new(false).error(&e.to_string());
            std::process::exit(1);
        }
    };
    init_tracing(runner.config().verbose);

    let result = runner.run().await;
    if let Err(e) = &result {
        runner.logger().error(&e.to_string());
    }
    std::process::exit(exit_code(&result));
}
