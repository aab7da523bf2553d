fn main() -> anyhow::Result<()> {
    hostlink_lib::run()
}
