mod logging;
mod selection;
