fn main() -> anyhow::Result<()> {
    matti_client::run()
}
