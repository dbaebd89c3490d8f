//! Participant-facing instruction texts.

pub const WELCOME: &str = "Welcome to the experiment!\n\n\
    You will see three white curves and a rotating black curve.\n\
    Focus on the black curve. Feel free to move around.\n\
    Which of the three white curves best matches the black curve?\n\n\
    Press 'A' to begin.";

pub const TASKS: &str = "During this experiment you will perform two tasks:\n\n\
    1. A rotating dashed curve. When an arrow appears, decide whether the\n\
    moving dashes travel in the arrow's direction.\n\
    2. A rotating solid curve. Adjust the white 3D curve with the joysticks\n\
    until it matches how you perceive the solid black curve.\n\n\
    Press 'A' to continue.";

pub const PRACTICE_INTRO: &str = "You will now practise each task.\n\
    Please remember the procedures.\n\n\
    Press 'A' when you are ready to continue.";

pub const PRACTICE_SOLID: &str = "[Practice] Look at the black 3D curve on your right.\n\
    Move each joystick up and down to adjust the white curve until it matches\n\
    the black one. Press 'A' once you are satisfied.\n\n\
    Press 'A' to begin the task.";

pub const PRACTICE_DASHED: &str = "[Practice] Focus on the dashed 3D curve. An arrow will appear.\n\
    Press 'Y' if the dashes move along the arrow's direction, otherwise press 'X'.\n\n\
    Press 'A' to begin the task.";

pub const READY: &str = "We can now start the experiment.\n\n\
    Press 'A' when you are ready to continue.";

pub const SOLID_TASK: &str = "Look at the black 3D curve on your right.\n\
    Move each joystick up and down to adjust the white curve until it matches\n\
    the black one. Press 'A' once you are satisfied.\n\n\
    Press 'A' to begin the task.";

pub const DASHED_TASK: &str = "Focus on the dashed 3D curve. An arrow will appear.\n\
    Press 'Y' if the dashes move along the arrow's direction, otherwise press 'X'.\n\n\
    Press 'A' to begin the task.";

pub const MIDPOINT: &str = "Great progress! You have completed half of the experiment.\n\n\
    Press 'A' when you are ready to continue.";

pub const FAREWELL: &str = "This concludes the experiment. Thank you for your participation!";
