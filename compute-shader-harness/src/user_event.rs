pub enum UserEvent {
    SetVSync(bool),
    ReloadShaders,
}
