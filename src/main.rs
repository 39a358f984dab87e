use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    pulsewatch::init_tracing();

    match pulsewatch::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
