fn main() -> anyhow::Result<()> {
    terminal_secrets::app::run()
}
