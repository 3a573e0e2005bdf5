use std::process::exit;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let exit_code = hippius_query::main_account().await;

    exit(exit_code);
}
