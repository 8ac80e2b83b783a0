fn main() -> anyhow::Result<()> {
    interplay::run_cli()
}
