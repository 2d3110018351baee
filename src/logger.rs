use std::panic::Location;

#[derive(Clone, Copy)]
pub enum LogLevel
{
    Debug,
    Message,
    Warning,
    Error,
}

impl LogLevel
{
    fn label(&self) -> &'static str
    {
        return match self
        {
            LogLevel::Debug => "DEBUG",
            LogLevel::Message => "MESSAGE",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
    }
}

pub trait Logger
{
    fn log_debug(&self, message: &str);
    fn log_message(&self, message: &str);
    fn log_warning(&self, message: &str);
    fn log_error(&self, message: &str);
}

//prints every entry along with the call site that produced it
pub struct ConsoleLogger;

impl ConsoleLogger
{
    fn write(&self, level: LogLevel, message: &str, location: &Location)
    {
        println!("{} : {}, called from {}: line: {}, column: {}", level.label(), message, location.file(), location.line(), location.column());
    }
}

impl Logger for ConsoleLogger
{
    #[track_caller]
    fn log_debug(&self, message: &str)
    {
        self.write(LogLevel::Debug, message, Location::caller());
    }

    #[track_caller]
    fn log_message(&self, message: &str)
    {
        self.write(LogLevel::Message, message, Location::caller());
    }

    #[track_caller]
    fn log_warning(&self, message: &str)
    {
        self.write(LogLevel::Warning, message, Location::caller());
    }

    #[track_caller]
    fn log_error(&self, message: &str)
    {
        self.write(LogLevel::Error, message, Location::caller());
    }
}

//swallows everything. Handy where a failure is already surfaced another way
pub struct NullLogger;

impl Logger for NullLogger
{
    fn log_debug(&self, _message: &str) {}

    fn log_message(&self, _message: &str) {}

    fn log_warning(&self, _message: &str) {}

    fn log_error(&self, _message: &str) {}
}
