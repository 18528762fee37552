mod recording_set;
mod support;
mod timer;
